//! Catalog of known branch names.
//!
//! The catalog is a plain value: callers load it, call [`Catalog::ensure`],
//! and persist it when the call reports a change.

use super::releases::{catalog_name, RELEASES_BRANCH};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Catalog ordering: the releases branch first, the rest by byte order.
pub fn compare_branch_names(a: &str, b: &str) -> Ordering {
    match (a == RELEASES_BRANCH, b == RELEASES_BRANCH) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

/// Sorted list of branch names exposed to the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    names: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from names, deduplicated and sorted.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self {
            names: names.into_iter().map(Into::into).collect(),
        };
        catalog.sort();
        catalog.names.dedup();
        catalog
    }

    /// Registers `branch`, resolving release tags to the releases branch.
    /// Returns true if the catalog changed.
    pub fn ensure(&mut self, branch: &str) -> bool {
        let name = catalog_name(branch);
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        self.sort();
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn sort(&mut self) {
        self.names.sort_by(|a, b| compare_branch_names(a, b));
    }
}
