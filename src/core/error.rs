use std::path::PathBuf;
use thiserror::Error;

/// Filesystem operation that failed, reported alongside the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// Reading a file
    Read,
    /// Writing a file
    Write,
    /// Creating a directory tree
    CreateDir,
    /// Renaming a temporary file over its target
    Rename,
}

impl IoOp {
    /// Returns the verb used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            IoOp::Read => "read",
            IoOp::Write => "write",
            IoOp::CreateDir => "create directory",
            IoOp::Rename => "rename",
        }
    }
}

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("IO error: failed to {} {}: {source}", op.as_str(), path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Decode error: {} is not a valid store file: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Creates a new IO error for the given operation and path
    pub fn io<P: Into<PathBuf>>(op: IoOp, path: P, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Creates a new decode error for the given path
    pub fn decode<P: Into<PathBuf>>(path: P, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Creates a new invalid entry error
    pub fn invalid_entry<S: Into<String>>(msg: S) -> Self {
        Self::InvalidEntry(msg.into())
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Decode { .. } => "decode",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::Parse { .. } => "parse",
            Self::InvalidEntry(_) => "validation",
        }
    }
}
