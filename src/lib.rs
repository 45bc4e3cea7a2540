//! benchtrail - continuous benchmark history for static dashboards.
//!
//! benchtrail keeps the results of benchmark runs as plain JSON files that a
//! static dashboard can fetch directly. Every branch gets its own
//! chronologically ordered log, and release tags are additionally collected
//! into one synthetic `releases` history.
//!
//! # Features
//!
//! - **Deduplicated history**: a rerun for the same commit and run
//!   parameters replaces the stored entry instead of adding another
//! - **Chronological logs**: ordered by commit date with timezone offsets
//!   respected, falling back to the numeric timestamp
//! - **Retention**: optional per-branch cap that drops the oldest entries
//! - **Release aggregation**: semantic-version tags feed a `releases` log
//!   and a commit to tag map
//! - **Atomic writes**: files are replaced through a temporary sibling
//!
//! # Architecture
//!
//! - `core`: record types, errors and configuration
//! - `storage`: on-disk layout, branch logs, catalog and the [`EntryStore`]
//! - `parse`: benchmark output parsers
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use benchtrail_lib::core::{Entry, MetricResult};
//! use benchtrail_lib::EntryStore;
//!
//! fn main() -> benchtrail_lib::Result<()> {
//!     let store = EntryStore::open("benchmarks")?;
//!     let entry = Entry::builder()
//!         .sha("3f2a9c1")
//!         .commit_date("2024-06-15T10:00:00Z")
//!         .metric(MetricResult::new("BenchmarkParse", 1523.4, "ns/op"))
//!         .build()?;
//!     store.append_entry("main", entry, 100)?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod core;
pub mod parse;
pub mod storage;

// Re-export core types for convenience
pub use crate::core::{BenchError, Config, Entry, Result};
pub use crate::storage::EntryStore;
