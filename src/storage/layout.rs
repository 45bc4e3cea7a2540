//! On-disk layout of a benchmark store.
//!
//! ```text
//! <root>/
//!   branches.json            catalog of branch names
//!   metadata.json            repository metadata
//!   data/
//!     <sanitized-branch>.json  entry log per branch
//!     release_tags.json        commit SHA -> release tag
//! ```

use std::path::{Path, PathBuf};

/// File name of the branch catalog.
pub const BRANCHES_FILE: &str = "branches.json";
/// File name of the repository metadata.
pub const METADATA_FILE: &str = "metadata.json";
/// Directory holding per-branch logs.
pub const DATA_DIR: &str = "data";
/// File name of the release tag map, inside [`DATA_DIR`].
pub const RELEASE_TAGS_FILE: &str = "release_tags.json";

/// Replaces characters that are unsafe in file names with `_`.
pub fn sanitize_branch_name(branch: &str) -> String {
    branch
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// File name (without directory) of a branch log, as fetched by the dashboard.
pub fn branch_file_name(branch: &str) -> String {
    format!("{}.json", sanitize_branch_name(branch))
}

/// Resolves store file paths under a root directory.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    /// Create a layout rooted at `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn branches_path(&self) -> PathBuf {
        self.root.join(BRANCHES_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn release_tags_path(&self) -> PathBuf {
        self.data_dir().join(RELEASE_TAGS_FILE)
    }

    /// Path of the log file for `branch`; the catalog keeps the original name
    pub fn branch_path(&self, branch: &str) -> PathBuf {
        self.data_dir().join(branch_file_name(branch))
    }
}
