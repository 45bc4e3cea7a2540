use crate::core::error::{BenchError, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treats a JSON `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads an optional count where `0` means unset.
fn zero_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.filter(|n| *n > 0))
}

/// Reads an optional string where `""` means unset.
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

fn is_unset_count(value: &Option<u32>) -> bool {
    matches!(value, None | Some(0))
}

fn is_unset_text(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// One named measurement produced by a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Benchmark name, including the unit suffix for secondary metrics
    pub name: String,
    /// Measured value
    pub value: f64,
    /// Unit string, e.g. `ns/op`
    pub unit: String,
    /// Free-text annotation (iterations, procs)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extra: String,
    /// Package path the benchmark was declared in
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "is_unset_text"
    )]
    pub package: Option<String>,
    /// Parallelism factor the benchmark ran with; zero is never stored
    #[serde(
        default,
        deserialize_with = "zero_as_none",
        skip_serializing_if = "is_unset_count"
    )]
    pub procs: Option<u32>,
}

impl MetricResult {
    /// Creates a metric with no annotation, package or procs
    pub fn new<S: Into<String>, U: Into<String>>(name: S, value: f64, unit: U) -> Self {
        MetricResult {
            name: name.into(),
            value,
            unit: unit.into(),
            extra: String::new(),
            package: None,
            procs: None,
        }
    }
}

/// Source-control revision a batch was measured against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitInfo {
    /// Commit SHA
    pub sha: String,
    /// First line of the commit message
    pub message: String,
    /// Commit author
    pub author: String,
    /// Commit date as an RFC 3339 string
    pub date: String,
    /// Browsable URL of the commit
    pub url: String,
}

impl CommitInfo {
    /// Parses the commit date as RFC 3339, `None` if it does not parse
    pub fn parsed_date(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date).ok()
    }

    /// Returns the first seven characters of the SHA
    pub fn short_sha(&self) -> &str {
        match self.sha.char_indices().nth(7) {
            Some((idx, _)) => &self.sha[..idx],
            None => &self.sha,
        }
    }
}

/// Environment a batch was measured under.
///
/// Every field takes part in equality and hashing: an empty toolchain
/// version is its own class, distinct from any explicit version.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RunParameters {
    /// CPU model string
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cpu: String,
    /// Operating system
    #[serde(rename = "goos", default, skip_serializing_if = "String::is_empty")]
    pub os: String,
    /// Architecture
    #[serde(rename = "goarch", default, skip_serializing_if = "String::is_empty")]
    pub arch: String,
    /// Toolchain version string
    #[serde(rename = "goVersion", default, skip_serializing_if = "String::is_empty")]
    pub toolchain: String,
    /// Native-code bridging enabled
    #[serde(default)]
    pub cgo: bool,
}

impl RunParameters {
    /// Builds a filesystem-safe name that differs for every matrix cell,
    /// e.g. `bench-linux-amd64-go1.22.0-cgo1`.
    pub fn artifact_name(&self) -> String {
        let mut parts = vec!["bench"];
        for part in [&self.os, &self.arch, &self.toolchain] {
            if !part.is_empty() {
                parts.push(part.as_str());
            }
        }
        let cgo = if self.cgo { "cgo1" } else { "cgo0" };
        parts.push(cgo);
        parts.join("-")
    }
}

/// Identity of a logical run within a branch log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    /// Commit SHA
    pub sha: String,
    /// Run parameters
    pub params: RunParameters,
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.sha, self.params.artifact_name())
    }
}

/// One persisted measurement batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Commit the batch was measured against
    pub commit: CommitInfo,
    /// Epoch milliseconds; sort fallback when the commit date does not parse
    #[serde(rename = "date", default)]
    pub timestamp: i64,
    /// Run parameters
    #[serde(default)]
    pub params: RunParameters,
    /// Measurements in display order
    #[serde(default, deserialize_with = "null_as_default")]
    pub benchmarks: Vec<MetricResult>,
}

impl Entry {
    /// Creates a new entry builder
    pub fn builder() -> EntryBuilder {
        EntryBuilder::default()
    }

    /// Returns the deduplication key of this entry
    pub fn key(&self) -> EntryKey {
        EntryKey {
            sha: self.commit.sha.clone(),
            params: self.params.clone(),
        }
    }
}

/// Builder for [`Entry`].
#[derive(Debug, Default)]
pub struct EntryBuilder {
    commit: CommitInfo,
    timestamp: Option<i64>,
    params: RunParameters,
    benchmarks: Vec<MetricResult>,
}

impl EntryBuilder {
    pub fn sha<S: Into<String>>(mut self, sha: S) -> Self {
        self.commit.sha = sha.into();
        self
    }

    pub fn message<S: Into<String>>(mut self, message: S) -> Self {
        self.commit.message = message.into();
        self
    }

    pub fn author<S: Into<String>>(mut self, author: S) -> Self {
        self.commit.author = author.into();
        self
    }

    pub fn commit_date<S: Into<String>>(mut self, date: S) -> Self {
        self.commit.date = date.into();
        self
    }

    pub fn url<S: Into<String>>(mut self, url: S) -> Self {
        self.commit.url = url.into();
        self
    }

    pub fn timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    pub fn params(mut self, params: RunParameters) -> Self {
        self.params = params;
        self
    }

    pub fn metric(mut self, metric: MetricResult) -> Self {
        self.benchmarks.push(metric);
        self
    }

    pub fn metrics(mut self, metrics: Vec<MetricResult>) -> Self {
        self.benchmarks.extend(metrics);
        self
    }

    /// Builds the entry. Without an explicit timestamp the commit date is
    /// used, or zero when the date does not parse.
    pub fn build(self) -> Result<Entry> {
        if self.commit.sha.is_empty() {
            return Err(BenchError::invalid_entry("commit SHA cannot be empty"));
        }
        let timestamp = self.timestamp.unwrap_or_else(|| {
            self.commit
                .parsed_date()
                .map(|date| date.timestamp_millis())
                .unwrap_or(0)
        });
        Ok(Entry {
            commit: self.commit,
            timestamp,
            params: self.params,
            benchmarks: self.benchmarks,
        })
    }
}

/// Repository-level information shown by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Repository URL
    #[serde(rename = "repoUrl", default)]
    pub repo_url: String,
    /// Epoch milliseconds of the last write
    #[serde(rename = "lastUpdate", default)]
    pub last_update: i64,
    /// Module or namespace identifier stripped from package names
    #[serde(
        rename = "moduleId",
        alias = "goModule",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub module_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn params() -> RunParameters {
        RunParameters {
            cpu: "cpu1".to_string(),
            os: "linux".to_string(),
            arch: "amd64".to_string(),
            toolchain: "go1.22.0".to_string(),
            cgo: true,
        }
    }

    #[test]
    fn test_entry_key_uses_sha_and_params() {
        let a = Entry::builder().sha("aaa").params(params()).build().unwrap();
        let b = Entry::builder()
            .sha("aaa")
            .params(params())
            .metric(MetricResult::new("BenchmarkX", 1.0, "ns/op"))
            .build()
            .unwrap();
        assert_eq!(a.key(), b.key());

        let mut other = params();
        other.toolchain.clear();
        let c = Entry::builder().sha("aaa").params(other).build().unwrap();
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_entry_key_has_no_delimiter_collisions() {
        let mut left = params();
        left.cpu = "a|b".to_string();
        left.os = "c".to_string();
        let mut right = params();
        right.cpu = "a".to_string();
        right.os = "b|c".to_string();

        let keys: HashSet<EntryKey> = [
            EntryKey { sha: "s".to_string(), params: left },
            EntryKey { sha: "s".to_string(), params: right },
        ]
        .into_iter()
        .collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_builder_rejects_empty_sha() {
        assert!(Entry::builder().build().is_err());
    }

    #[test]
    fn test_builder_derives_timestamp_from_commit_date() {
        let entry = Entry::builder()
            .sha("aaa")
            .commit_date("2024-01-01T00:00:00Z")
            .build()
            .unwrap();
        assert_eq!(entry.timestamp, 1704067200000);

        let entry = Entry::builder().sha("aaa").commit_date("yesterday").build().unwrap();
        assert_eq!(entry.timestamp, 0);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = Entry::builder()
            .sha("abc123")
            .message("Fix \"quoted\" <things> & stuff\tok")
            .author("dev")
            .commit_date("2024-06-15T10:00:00Z")
            .url("https://example.com/commit/abc123")
            .params(RunParameters {
                cpu: "cpu1".to_string(),
                os: "linux".to_string(),
                ..Default::default()
            })
            .metric(MetricResult::new("BenchmarkA", 1523.4, "ns/op"))
            .build()
            .unwrap();

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["date"], 1718445600000_i64);
        assert_eq!(value["params"]["goos"], "linux");
        assert_eq!(value["params"]["cgo"], false);
        assert!(value["params"].get("goarch").is_none());
        assert!(value["params"].get("goVersion").is_none());
        assert!(value["benchmarks"][0].get("extra").is_none());
        assert!(value["benchmarks"][0].get("package").is_none());
        assert!(value["benchmarks"][0].get("procs").is_none());

        let decoded: Entry = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_zero_procs_and_empty_package_are_omitted() {
        let json = r#"{"name":"BenchmarkA","value":1.5,"unit":"ns/op","package":"","procs":0}"#;
        let metric: MetricResult = serde_json::from_str(json).unwrap();
        assert_eq!(metric.procs, None);
        assert_eq!(metric.package, None);

        let reencoded = serde_json::to_value(&metric).unwrap();
        assert!(reencoded.get("procs").is_none());
        assert!(reencoded.get("package").is_none());

        let explicit = MetricResult {
            procs: Some(0),
            package: Some(String::new()),
            ..MetricResult::new("BenchmarkA", 1.5, "ns/op")
        };
        let value = serde_json::to_value(&explicit).unwrap();
        assert!(value.get("procs").is_none());
        assert!(value.get("package").is_none());

        let kept: MetricResult =
            serde_json::from_str(r#"{"name":"B","value":1,"unit":"ns/op","procs":8}"#).unwrap();
        assert_eq!(kept.procs, Some(8));
    }

    #[test]
    fn test_entry_decodes_null_benchmarks() {
        let json = r#"{"commit":{"sha":"a"},"date":5,"params":{"cgo":false},"benchmarks":null}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert!(entry.benchmarks.is_empty());
        assert_eq!(entry.timestamp, 5);
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(params().artifact_name(), "bench-linux-amd64-go1.22.0-cgo1");
        assert_eq!(RunParameters::default().artifact_name(), "bench-cgo0");
    }

    #[test]
    fn test_short_sha() {
        let commit = CommitInfo {
            sha: "0123456789abcdef".to_string(),
            ..Default::default()
        };
        assert_eq!(commit.short_sha(), "0123456");
        let commit = CommitInfo {
            sha: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(commit.short_sha(), "abc");
    }

    #[test]
    fn test_metadata_reads_legacy_module_key() {
        let meta: Metadata =
            serde_json::from_str(r#"{"repoUrl":"https://x","lastUpdate":7,"goModule":"x/y"}"#)
                .unwrap();
        assert_eq!(meta.module_id.as_deref(), Some("x/y"));
        let out = serde_json::to_value(&meta).unwrap();
        assert_eq!(out["moduleId"], "x/y");
    }
}
