//! Durable benchmark history.
//!
//! This module owns the on-disk representation of benchmark entries:
//! per-branch logs, the branch catalog, release tag aggregation and
//! repository metadata, all as JSON files under one root directory.

pub mod branch_log;
pub mod catalog;
pub mod files;
pub mod layout;
pub mod releases;
pub mod store;

// Re-export commonly used types
pub use branch_log::{merge_entries, BranchLog, MergeOutcome, PendingLog};
pub use catalog::Catalog;
pub use files::WriteMode;
pub use layout::{branch_file_name, sanitize_branch_name, StoreLayout};
pub use releases::{
    is_release_tag, MergePlan, MergeReport, ReleaseAggregator, ReleaseTagMap, RELEASES_BRANCH,
};
pub use store::{AppendOutcome, EntryStore};
