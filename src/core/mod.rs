//! Core domain models, errors and configuration for benchtrail.
//!
//! This module contains the record types every other module exchanges:
//! measurement batches, their identity keys and repository metadata.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder};
pub use error::{BenchError, IoOp, Result};
pub use types::{CommitInfo, Entry, EntryBuilder, EntryKey, Metadata, MetricResult, RunParameters};
