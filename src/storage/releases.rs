//! Release tag aggregation.
//!
//! Branch names that look like semantic-version tags (`v1.2.3`,
//! `1.2.3-beta.1`) are not cataloged on their own. Their entries are merged
//! into the tag's own log and into the synthetic [`RELEASES_BRANCH`] log, and
//! each commit SHA is mapped to the tag that produced it.

use super::branch_log::{BranchLog, MergeOutcome, PendingLog};
use super::files::{read_json, write_json, WriteMode};
use super::layout::StoreLayout;
use crate::core::{Entry, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name of the synthetic branch aggregating every release tag.
pub const RELEASES_BRANCH: &str = "releases";

static RELEASE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?[0-9]+\.[0-9]+\.[0-9]+(?:[-+][0-9A-Za-z.+-]*)?$")
        .expect("release tag pattern is valid")
});

/// Reports whether `name` is a release tag: optional `v`, then
/// `MAJOR.MINOR.PATCH`, then an optional pre-release or build suffix.
pub fn is_release_tag(name: &str) -> bool {
    RELEASE_TAG.is_match(name)
}

/// Name under which `branch` is registered in the catalog.
pub fn catalog_name(branch: &str) -> &str {
    if is_release_tag(branch) {
        RELEASES_BRANCH
    } else {
        branch
    }
}

/// Commit SHA to release tag name. The last tag recorded for a SHA wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseTagMap(BTreeMap<String, String>);

impl ReleaseTagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps every entry's SHA to `tag`. Entries without a SHA are skipped.
    /// Returns the number of SHAs recorded.
    pub fn record(&mut self, tag: &str, entries: &[Entry]) -> usize {
        let mut recorded = 0;
        for entry in entries {
            if entry.commit.sha.is_empty() {
                continue;
            }
            self.0.insert(entry.commit.sha.clone(), tag.to_string());
            recorded += 1;
        }
        recorded
    }

    pub fn get(&self, sha: &str) -> Option<&str> {
        self.0.get(sha).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(sha, tag)| (sha.as_str(), tag.as_str()))
    }
}

/// Everything a merge into `branch` will write, computed up front.
#[derive(Debug, Clone)]
pub struct MergePlan {
    /// The branch's (or tag's) own log
    pub branch: PendingLog,
    /// The aggregate log, for release tags only
    pub aggregate: Option<PendingLog>,
    /// The updated tag map, for release tags only
    pub tags: Option<ReleaseTagMap>,
    /// SHAs mapped to the tag
    pub tags_recorded: usize,
}

/// Result of a merge through the aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Merge into the branch's own log
    pub branch: MergeOutcome,
    /// Merge into the aggregate log, if the branch was a release tag
    pub aggregate: Option<MergeOutcome>,
    /// SHAs mapped to the tag
    pub tags_recorded: usize,
}

impl MergePlan {
    /// Summary of the planned merge
    pub fn report(&self) -> MergeReport {
        MergeReport {
            branch: self.branch.outcome,
            aggregate: self.aggregate.as_ref().map(|p| p.outcome),
            tags_recorded: self.tags_recorded,
        }
    }
}

/// Routes merges for release tags into the aggregate log and tag map.
#[derive(Debug, Clone)]
pub struct ReleaseAggregator {
    log: BranchLog,
    tags_path: PathBuf,
    write_mode: WriteMode,
}

impl ReleaseAggregator {
    pub fn new(layout: &StoreLayout, write_mode: WriteMode) -> Self {
        Self {
            log: BranchLog::new(layout.clone(), write_mode),
            tags_path: layout.release_tags_path(),
            write_mode,
        }
    }

    /// Reads the tag map, empty if none was recorded yet.
    pub fn read_tags(&self) -> Result<ReleaseTagMap> {
        read_json(&self.tags_path)
    }

    pub fn write_tags(&self, tags: &ReleaseTagMap) -> Result<()> {
        write_json(&self.tags_path, tags, self.write_mode)
    }

    /// Loads every file the merge touches and computes the new contents.
    /// Nothing is written, so a decode failure aborts before any change.
    pub fn plan(&self, branch: &str, entries: &[Entry], max_items: usize) -> Result<MergePlan> {
        let own = self.log.plan_merge(branch, entries, max_items)?;

        if !is_release_tag(branch) {
            return Ok(MergePlan {
                branch: own,
                aggregate: None,
                tags: None,
                tags_recorded: 0,
            });
        }

        let aggregate = self.log.plan_merge(RELEASES_BRANCH, entries, max_items)?;
        let mut tags = self.read_tags()?;
        let tags_recorded = tags.record(branch, entries);
        tracing::debug!(
            "Release tag {:?}: {} SHAs mapped, aggregate log now {} entries",
            branch,
            tags_recorded,
            aggregate.outcome.total
        );

        Ok(MergePlan {
            branch: own,
            aggregate: Some(aggregate),
            tags: Some(tags),
            tags_recorded,
        })
    }

    /// Writes a planned merge: own log, aggregate log, then the tag map.
    pub fn commit(&self, plan: &MergePlan) -> Result<()> {
        self.log.commit(&plan.branch)?;
        if let Some(aggregate) = &plan.aggregate {
            self.log.commit(aggregate)?;
        }
        if let Some(tags) = &plan.tags {
            self.write_tags(tags)?;
        }
        Ok(())
    }

    /// Merges `entries` into `branch`; for release tags also into the
    /// aggregate log, recording the SHA to tag mapping.
    pub fn merge(&self, branch: &str, entries: &[Entry], max_items: usize) -> Result<MergeReport> {
        if entries.is_empty() {
            return Ok(MergeReport::default());
        }
        let plan = self.plan(branch, entries, max_items)?;
        self.commit(&plan)?;
        Ok(plan.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::files::ensure_dir;
    use tempfile::TempDir;

    #[test]
    fn test_is_release_tag() {
        let cases = [
            ("v1.0.0", true),
            ("v0.1.0", true),
            ("v12.34.56", true),
            ("v1.2.3-beta.1", true),
            ("v1.2.3-rc.1", true),
            ("1.0.0", true),
            ("0.1.0", true),
            ("1.2.3-alpha", true),
            ("1.2.3+build.5", true),
            ("main", false),
            ("develop", false),
            ("feature/foo", false),
            ("release/1.0", false),
            ("v1", false),
            ("v1.0", false),
            ("releases", false),
            ("", false),
            ("vv1.2.3", false),
            ("1.2.3/hotfix", false),
        ];
        for (name, want) in cases {
            assert_eq!(is_release_tag(name), want, "is_release_tag({name:?})");
        }
    }

    #[test]
    fn test_catalog_name() {
        assert_eq!(catalog_name("v1.2.3"), RELEASES_BRANCH);
        assert_eq!(catalog_name("main"), "main");
        assert_eq!(catalog_name("releases"), "releases");
    }

    #[test]
    fn test_record_overwrites_retagged_sha() {
        let entry = Entry::builder().sha("abc").build().unwrap();
        let mut tags = ReleaseTagMap::new();
        assert_eq!(tags.record("v1.0.0", std::slice::from_ref(&entry)), 1);
        assert_eq!(tags.record("v1.0.1", std::slice::from_ref(&entry)), 1);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("abc"), Some("v1.0.1"));
    }

    #[test]
    fn test_record_skips_empty_sha() {
        let mut tags = ReleaseTagMap::new();
        assert_eq!(tags.record("v1.0.0", &[Entry::default()]), 0);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_tag_map_serializes_as_object() {
        let mut tags = ReleaseTagMap::new();
        let entries = [
            Entry::builder().sha("bbb").build().unwrap(),
            Entry::builder().sha("aaa").build().unwrap(),
        ];
        tags.record("v2.0.0", &entries);
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"{"aaa":"v2.0.0","bbb":"v2.0.0"}"#);
    }

    #[test]
    fn test_plain_branch_leaves_aggregate_alone() {
        let dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(dir.path());
        ensure_dir(&layout.data_dir()).unwrap();
        let aggregator = ReleaseAggregator::new(&layout, WriteMode::Atomic);

        let entry = Entry::builder()
            .sha("aaa")
            .commit_date("2024-01-01T00:00:00Z")
            .build()
            .unwrap();
        let report = aggregator.merge("main", &[entry], 0).unwrap();

        assert!(report.aggregate.is_none());
        assert_eq!(report.tags_recorded, 0);
        assert!(layout.branch_path("main").exists());
        assert!(!layout.branch_path(RELEASES_BRANCH).exists());
        assert!(!layout.release_tags_path().exists());
    }

    #[test]
    fn test_release_tag_feeds_aggregate() {
        let dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(dir.path());
        ensure_dir(&layout.data_dir()).unwrap();
        let aggregator = ReleaseAggregator::new(&layout, WriteMode::Atomic);

        let entry = Entry::builder()
            .sha("aaa")
            .commit_date("2024-01-01T00:00:00Z")
            .build()
            .unwrap();
        let report = aggregator.merge("v1.0.0", &[entry], 0).unwrap();

        assert_eq!(report.aggregate.map(|o| o.total), Some(1));
        assert_eq!(report.tags_recorded, 1);
        assert!(layout.branch_path("v1.0.0").exists());
        assert!(layout.branch_path(RELEASES_BRANCH).exists());
        assert_eq!(aggregator.read_tags().unwrap().get("aaa"), Some("v1.0.0"));
    }
}
