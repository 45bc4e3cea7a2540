//! Common test utilities and fixtures.

#![allow(dead_code)]

use benchtrail_lib::core::{Entry, MetricResult, RunParameters};
use benchtrail_lib::EntryStore;
use tempfile::TempDir;

/// Test fixture builder for creating entries with sensible defaults.
pub struct TestEntryBuilder {
    sha: String,
    date: String,
    timestamp: Option<i64>,
    params: RunParameters,
    value: f64,
}

impl TestEntryBuilder {
    pub fn new(sha: &str, date: &str) -> Self {
        Self {
            sha: sha.to_string(),
            date: date.to_string(),
            timestamp: None,
            params: RunParameters {
                cpu: "TestCPU".to_string(),
                os: "linux".to_string(),
                arch: "amd64".to_string(),
                ..Default::default()
            },
            value: 100.0,
        }
    }

    pub fn cpu(mut self, cpu: &str) -> Self {
        self.params.cpu = cpu.to_string();
        self
    }

    pub fn os(mut self, os: &str) -> Self {
        self.params.os = os.to_string();
        self
    }

    pub fn arch(mut self, arch: &str) -> Self {
        self.params.arch = arch.to_string();
        self
    }

    pub fn toolchain(mut self, toolchain: &str) -> Self {
        self.params.toolchain = toolchain.to_string();
        self
    }

    pub fn cgo(mut self, cgo: bool) -> Self {
        self.params.cgo = cgo;
        self
    }

    pub fn timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn build(self) -> Entry {
        let mut builder = Entry::builder()
            .sha(self.sha)
            .commit_date(self.date)
            .params(self.params)
            .metric(MetricResult::new("BenchmarkFoo", self.value, "ns/op"));
        if let Some(millis) = self.timestamp {
            builder = builder.timestamp(millis);
        }
        builder.build().unwrap()
    }
}

/// Shorthand for an entry with default run parameters.
pub fn entry(sha: &str, date: &str) -> Entry {
    TestEntryBuilder::new(sha, date).build()
}

/// Opens a store in a fresh temporary directory.
pub fn temp_store() -> (TempDir, EntryStore) {
    let dir = TempDir::new().unwrap();
    let store = EntryStore::open(dir.path()).unwrap();
    (dir, store)
}

/// SHAs of a history, in stored order.
pub fn shas(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.commit.sha.as_str()).collect()
}
