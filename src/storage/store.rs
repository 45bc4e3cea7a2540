//! Entry store facade.
//!
//! Composes the catalog, branch logs and release aggregation behind the
//! operations the CLI calls. Every operation is a fresh load, compute and
//! store cycle; there is no cache across calls and no locking, so at most
//! one writer process may target a store at a time.

use super::branch_log::BranchLog;
use super::catalog::Catalog;
use super::files::{ensure_dir, read_json, write_json, WriteMode};
use super::layout::StoreLayout;
use super::releases::{MergeReport, ReleaseAggregator, ReleaseTagMap};
use crate::core::config::StorageConfig;
use crate::core::{BenchError, Entry, Metadata, Result};
use chrono::Utc;
use std::path::Path;

/// Result of [`EntryStore::append_entries`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Whether the catalog gained a name
    pub branch_added: bool,
    /// Per-log merge details
    pub merge: MergeReport,
}

/// File-backed benchmark history.
#[derive(Debug, Clone)]
pub struct EntryStore {
    layout: StoreLayout,
    logs: BranchLog,
    releases: ReleaseAggregator,
    write_mode: WriteMode,
}

impl EntryStore {
    /// Open (or create) a store rooted at `root` with atomic writes.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::open_with_mode(root, WriteMode::Atomic)
    }

    /// Open (or create) a store rooted at `root`.
    pub fn open_with_mode<P: AsRef<Path>>(root: P, write_mode: WriteMode) -> Result<Self> {
        let layout = StoreLayout::new(root.as_ref());
        ensure_dir(&layout.data_dir())?;
        tracing::debug!("Opened benchmark store at {}", layout.root().display());

        Ok(Self {
            logs: BranchLog::new(layout.clone(), write_mode),
            releases: ReleaseAggregator::new(&layout, write_mode),
            layout,
            write_mode,
        })
    }

    /// Open the store described by the storage configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::open_with_mode(&config.data_dir, config.write_mode())
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Reads the branch catalog, empty if none exists yet.
    pub fn read_catalog(&self) -> Result<Catalog> {
        read_json(&self.layout.branches_path())
    }

    pub fn write_catalog(&self, catalog: &Catalog) -> Result<()> {
        write_json(&self.layout.branches_path(), catalog, self.write_mode)
    }

    /// Registers `branch` in the catalog (release tags register the
    /// releases branch). Returns true if the catalog changed.
    pub fn ensure_branch(&self, branch: &str) -> Result<bool> {
        let mut catalog = self.read_catalog()?;
        if !catalog.ensure(branch) {
            return Ok(false);
        }
        self.write_catalog(&catalog)?;
        tracing::info!("Registered branch {:?} in the catalog", branch);
        Ok(true)
    }

    /// Reads the stored history of `branch`.
    pub fn read_branch_history(&self, branch: &str) -> Result<Vec<Entry>> {
        self.logs.read(branch)
    }

    /// Replaces the stored history of `branch` verbatim.
    pub fn write_branch_history(&self, branch: &str, entries: &[Entry]) -> Result<()> {
        self.logs.write(branch, entries)
    }

    /// Reads the commit SHA to release tag map.
    pub fn read_release_tags(&self) -> Result<ReleaseTagMap> {
        self.releases.read_tags()
    }

    /// Appends a single entry; identical on disk to a one-element batch.
    pub fn append_entry(&self, branch: &str, entry: Entry, max_items: usize) -> Result<AppendOutcome> {
        self.append_entries(branch, &[entry], max_items)
    }

    /// Merges a batch into `branch` in one read-modify-write cycle.
    ///
    /// Entries sharing a (SHA, run parameters) key with stored ones replace
    /// them. The log is re-sorted by commit time and trimmed to `max_items`
    /// (zero keeps everything). Release tags additionally feed the releases
    /// branch and the tag map.
    ///
    /// All files are loaded and the new contents computed before the first
    /// write. Logs are written before the catalog, so the catalog never
    /// names a branch whose data failed to persist.
    pub fn append_entries(
        &self,
        branch: &str,
        batch: &[Entry],
        max_items: usize,
    ) -> Result<AppendOutcome> {
        if batch.is_empty() {
            tracing::debug!("Empty batch for branch {:?}, nothing to do", branch);
            return Ok(AppendOutcome::default());
        }
        if let Some(pos) = batch.iter().position(|e| e.commit.sha.is_empty()) {
            return Err(BenchError::invalid_entry(format!(
                "entry {} of the batch for branch {:?} has no commit SHA",
                pos, branch
            )));
        }

        let mut catalog = self.read_catalog()?;
        let branch_added = catalog.ensure(branch);
        let plan = self.releases.plan(branch, batch, max_items)?;

        self.releases.commit(&plan)?;
        if branch_added {
            self.write_catalog(&catalog)?;
            tracing::info!("Registered branch {:?} in the catalog", branch);
        }

        let merge = plan.report();
        tracing::info!(
            "Stored {} entries for branch {:?}: {} replaced, {} trimmed, {} total",
            batch.len(),
            branch,
            merge.branch.replaced,
            merge.branch.trimmed,
            merge.branch.total
        );

        Ok(AppendOutcome {
            branch_added,
            merge,
        })
    }

    /// Reads repository metadata, default if none was written yet.
    pub fn read_metadata(&self) -> Result<Metadata> {
        read_json(&self.layout.metadata_path())
    }

    /// Replaces the metadata wholesale, stamping the current time.
    pub fn write_metadata(&self, repo_url: &str, module_id: Option<&str>) -> Result<Metadata> {
        let metadata = Metadata {
            repo_url: repo_url.to_string(),
            last_update: Utc::now().timestamp_millis(),
            module_id: module_id.filter(|m| !m.is_empty()).map(str::to_string),
        };
        write_json(&self.layout.metadata_path(), &metadata, self.write_mode)?;
        Ok(metadata)
    }
}
