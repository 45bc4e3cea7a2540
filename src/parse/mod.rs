//! Benchmark output parsers.
//!
//! Parsers turn raw tool output into [`MetricResult`](crate::core::MetricResult)
//! lists that the CLI packages into entries.

pub mod gobench;

pub use gobench::{parse_go_bench, ParsedOutput};
