//! Per-branch entry logs.
//!
//! A branch log is kept sorted by effective commit time and holds at most
//! one entry per [`EntryKey`]. Merging a batch replaces every existing entry
//! that shares a key with the batch, keeps the log sorted, then trims to the
//! retention limit, so the retained window is always the chronologically
//! latest one.
//!
//! The incoming entry always wins over a stored one with the same key, even
//! if the stored one carries a later date. A replacement whose commit time is
//! unchanged keeps its position among entries with equal times.

use super::files::{read_json, write_json, WriteMode};
use super::layout::StoreLayout;
use crate::core::{Entry, EntryKey, Result};
use chrono::{DateTime, FixedOffset};
use std::collections::HashSet;

/// Counters describing what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Existing entries evicted because the batch shares their key
    pub replaced: usize,
    /// Batch entries whose key was not in the log yet
    pub appended: usize,
    /// Oldest entries dropped by the retention limit
    pub trimmed: usize,
    /// Entries in the log after the merge
    pub total: usize,
    /// Whether any entry lacked an RFC 3339 commit date
    pub timestamp_fallback: bool,
}

/// Effective commit time of an entry.
#[derive(Debug, Clone, Copy)]
struct SortKey {
    date: Option<DateTime<FixedOffset>>,
    millis: i64,
}

impl SortKey {
    fn of(entry: &Entry) -> Self {
        Self {
            date: entry.commit.parsed_date(),
            millis: entry.timestamp,
        }
    }

    /// Parsed commit dates when both sides parse, numeric timestamps otherwise.
    fn precedes(&self, other: &SortKey) -> bool {
        match (self.date, other.date) {
            (Some(a), Some(b)) => a < b,
            _ => self.millis < other.millis,
        }
    }
}

fn same_key(a: &Entry, b: &Entry) -> bool {
    a.commit.sha == b.commit.sha && a.params == b.params
}

/// Whether `a` sorts strictly before `b` in a branch log.
pub fn commit_precedes(a: &Entry, b: &Entry) -> bool {
    SortKey::of(a).precedes(&SortKey::of(b))
}

/// Stable sort by effective commit time. Returns true when at least one
/// entry had an unparseable commit date.
///
/// The mixed comparison (date against timestamp) is not guaranteed to be a
/// total order, so this uses an insertion sort, which is stable and well
/// defined for any comparator. Logs arrive almost sorted, making it cheap.
pub fn sort_chronologically(entries: &mut Vec<Entry>) -> bool {
    let mut keyed: Vec<(SortKey, Entry)> =
        entries.drain(..).map(|e| (SortKey::of(&e), e)).collect();

    for i in 1..keyed.len() {
        let mut j = i;
        while j > 0 && keyed[j].0.precedes(&keyed[j - 1].0) {
            keyed.swap(j, j - 1);
            j -= 1;
        }
    }

    let fallback = keyed.iter().any(|(key, _)| key.date.is_none());
    entries.extend(keyed.into_iter().map(|(_, e)| e));
    fallback
}

/// Drops the oldest entries so that at most `max_items` remain.
/// Zero means unlimited. Returns the number of dropped entries.
pub fn apply_retention(entries: &mut Vec<Entry>, max_items: usize) -> usize {
    if max_items == 0 || entries.len() <= max_items {
        return 0;
    }
    let excess = entries.len() - max_items;
    entries.drain(..excess);
    excess
}

/// Merges `incoming` into `existing` without touching the filesystem.
///
/// Batch entries are applied in order, each replacing the entry with its key
/// in place or joining the log, followed by a re-sort. A batch therefore
/// gives the same log as appending its entries one at a time, and within
/// the batch the last entry for a key wins. Retention is applied once, after
/// the whole batch.
pub fn merge_entries(
    existing: Vec<Entry>,
    incoming: &[Entry],
    max_items: usize,
) -> (Vec<Entry>, MergeOutcome) {
    let mut merged = existing;
    merged.reserve(incoming.len());
    let mut timestamp_fallback = sort_chronologically(&mut merged);

    let mut seen: HashSet<EntryKey> = HashSet::with_capacity(incoming.len());
    let mut replaced = 0;
    let mut appended = 0;
    for entry in incoming {
        let first_in_batch = seen.insert(entry.key());
        match merged.iter().position(|e| same_key(e, entry)) {
            Some(pos) => {
                merged[pos] = entry.clone();
                if first_in_batch {
                    replaced += 1;
                }
            },
            None => {
                merged.push(entry.clone());
                appended += 1;
            },
        }
        timestamp_fallback |= sort_chronologically(&mut merged);
    }

    let trimmed = apply_retention(&mut merged, max_items);

    let outcome = MergeOutcome {
        replaced,
        appended,
        trimmed,
        total: merged.len(),
        timestamp_fallback,
    };
    (merged, outcome)
}

/// A computed branch log that has not been written yet.
#[derive(Debug, Clone)]
pub struct PendingLog {
    /// Branch the log belongs to
    pub branch: String,
    /// Full log contents to persist
    pub entries: Vec<Entry>,
    /// What the merge did
    pub outcome: MergeOutcome,
}

/// File-backed branch logs under a store root.
#[derive(Debug, Clone)]
pub struct BranchLog {
    layout: StoreLayout,
    write_mode: WriteMode,
}

impl BranchLog {
    pub fn new(layout: StoreLayout, write_mode: WriteMode) -> Self {
        Self { layout, write_mode }
    }

    /// Reads the entries of `branch`, empty if nothing was stored yet.
    pub fn read(&self, branch: &str) -> Result<Vec<Entry>> {
        read_json(&self.layout.branch_path(branch))
    }

    /// Replaces the stored entries of `branch` with `entries` verbatim.
    pub fn write(&self, branch: &str, entries: &[Entry]) -> Result<()> {
        write_json(&self.layout.branch_path(branch), entries, self.write_mode)
    }

    /// Loads `branch` and computes the merged log without writing it.
    pub fn plan_merge(
        &self,
        branch: &str,
        incoming: &[Entry],
        max_items: usize,
    ) -> Result<PendingLog> {
        let existing = self.read(branch)?;
        tracing::debug!(
            "Merging {} new entries into {} existing entries of branch {:?}",
            incoming.len(),
            existing.len(),
            branch
        );

        let (entries, outcome) = merge_entries(existing, incoming, max_items);
        if outcome.timestamp_fallback {
            tracing::warn!(
                "Branch {:?} has commit dates that are not RFC 3339; ordering fell back to timestamps",
                branch
            );
        }
        if outcome.trimmed > 0 {
            tracing::debug!(
                "Trimmed {} oldest entries of branch {:?} (limit {})",
                outcome.trimmed,
                branch,
                max_items
            );
        }

        Ok(PendingLog {
            branch: branch.to_string(),
            entries,
            outcome,
        })
    }

    /// Persists a previously planned merge.
    pub fn commit(&self, pending: &PendingLog) -> Result<()> {
        self.write(&pending.branch, &pending.entries)
    }

    /// Merges `incoming` into `branch` and persists the result.
    /// An empty batch leaves the log untouched.
    pub fn merge(&self, branch: &str, incoming: &[Entry], max_items: usize) -> Result<MergeOutcome> {
        if incoming.is_empty() {
            return Ok(MergeOutcome::default());
        }
        let pending = self.plan_merge(branch, incoming, max_items)?;
        self.commit(&pending)?;
        Ok(pending.outcome)
    }
}
