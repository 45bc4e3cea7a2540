//! Configuration management for benchtrail.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable overrides (through the CLI)
//! - CLI argument overrides
//! - Validation and defaults

use crate::core::{BenchError, Result};
use crate::storage::WriteMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete configuration for benchtrail
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration
    pub storage: StorageConfig,
    /// Repository configuration
    pub repository: RepositoryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the benchmark store
    pub data_dir: PathBuf,
    /// Maximum entries kept per branch log (0 = unlimited)
    pub max_items: usize,
    /// Replace files through a temporary file and rename
    pub atomic_writes: bool,
}

/// Repository configuration written to the store metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Repository URL shown by the dashboard
    pub repo_url: Option<String>,
    /// Module identifier stripped from package names
    pub module_id: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Include targets and line numbers in log lines
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("benchmarks"),
            max_items: 0,
            atomic_writes: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl StorageConfig {
    /// File replacement strategy for this configuration
    pub fn write_mode(&self) -> WriteMode {
        if self.atomic_writes {
            WriteMode::Atomic
        } else {
            WriteMode::Direct
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(BenchError::config("storage.data_dir cannot be empty"));
        }

        if let Some(url) = &self.repository.repo_url {
            if url.trim().is_empty() {
                return Err(BenchError::config("repository.repo_url cannot be blank"));
            }
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| BenchError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set data directory
    pub fn data_dir(mut self, path: PathBuf) -> Self {
        self.config.storage.data_dir = path;
        self
    }

    /// Set retention limit per branch
    pub fn max_items(mut self, count: usize) -> Self {
        self.config.storage.max_items = count;
        self
    }

    /// Enable or disable atomic file replacement
    pub fn atomic_writes(mut self, enable: bool) -> Self {
        self.config.storage.atomic_writes = enable;
        self
    }

    /// Set repository URL
    pub fn repo_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.repository.repo_url = Some(url.into());
        self
    }

    /// Set module identifier
    pub fn module_id<S: Into<String>>(mut self, module: S) -> Self {
        self.config.repository.module_id = Some(module.into());
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.write_mode(), WriteMode::Atomic);
    }

    #[test]
    fn test_empty_data_dir_rejected() {
        let config = ConfigBuilder::new().data_dir(PathBuf::new()).build();
        assert!(config.is_err());
    }

    #[test]
    fn test_blank_repo_url_rejected() {
        assert!(ConfigBuilder::new().repo_url("  ").build().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .data_dir(PathBuf::from("gh-pages/bench"))
            .max_items(200)
            .atomic_writes(false)
            .module_id("github.com/user/repo")
            .debug(true)
            .build()
            .unwrap();

        assert_eq!(config.storage.data_dir, PathBuf::from("gh-pages/bench"));
        assert_eq!(config.storage.max_items, 200);
        assert_eq!(config.storage.write_mode(), WriteMode::Direct);
        assert_eq!(config.repository.module_id.as_deref(), Some("github.com/user/repo"));
        assert!(config.debug);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
storage:
  data_dir: out/bench
  max_items: 50
repository:
  repo_url: https://github.com/user/repo
logging:
  level: debug
"#;

        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("out/bench"));
        assert_eq!(config.storage.max_items, 50);
        assert!(config.storage.atomic_writes);
        assert_eq!(
            config.repository.repo_url.as_deref(),
            Some("https://github.com/user/repo")
        );
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(ConfigBuilder::new().from_yaml("storage: [").is_err());
    }
}
