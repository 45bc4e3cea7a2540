//! Parser for `go test -bench` text output.
//!
//! Result lines follow the standard benchmark format:
//!
//! ```text
//! BenchmarkName-PROCS    ITERATIONS    VALUE UNIT [VALUE UNIT ...]
//! ```
//!
//! `pkg:` header lines set the package of the results that follow, and the
//! first `cpu:` header is kept as the detected CPU model. Anything else
//! (`goos:`, `PASS`, `ok ...`, test logs) is ignored.

use crate::core::{BenchError, MetricResult, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static RESULT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>Benchmark\S+?)(?:-(?P<procs>\d+))?\s+(?P<iters>\d+)\s+(?P<rest>.+)$")
        .expect("result line pattern is valid")
});

static PKG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^pkg:\s+(\S+)").expect("pkg line pattern is valid"));

static CPU_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^cpu:\s+(.+)$").expect("cpu line pattern is valid"));

/// Results and header metadata extracted from one benchmark run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    /// One result per value/unit pair, in output order
    pub results: Vec<MetricResult>,
    /// CPU model from the first `cpu:` line, if any
    pub cpu: Option<String>,
}

/// Parses `go test -bench` output.
///
/// The first metric of a line keeps the bare benchmark name; later metrics
/// are named `"<name> - <unit>"` so every series stays distinct. Lines with
/// an odd number of value/unit fields are skipped, as are values that do
/// not parse as numbers. Output without a single result is an error.
pub fn parse_go_bench(input: &str) -> Result<ParsedOutput> {
    let mut parsed = ParsedOutput::default();
    let mut package: Option<String> = None;

    for line in input.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(caps) = PKG_LINE.captures(line) {
            package = Some(caps[1].to_string());
            continue;
        }

        if let Some(caps) = CPU_LINE.captures(line) {
            if parsed.cpu.is_none() {
                parsed.cpu = Some(caps[1].trim().to_string());
            }
            continue;
        }

        let Some(caps) = RESULT_LINE.captures(line) else {
            continue;
        };

        let name = &caps["name"];
        let procs = caps
            .name("procs")
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|n| *n > 0);

        let mut extra = format!("{} times", &caps["iters"]);
        if let Some(procs) = procs {
            extra.push_str(&format!("\n{} procs", procs));
        }

        let fields: Vec<&str> = caps["rest"].split_whitespace().collect();
        if fields.len() < 2 || fields.len() % 2 != 0 {
            tracing::debug!("Skipping malformed benchmark line: {:?}", line);
            continue;
        }

        for (i, pair) in fields.chunks_exact(2).enumerate() {
            let Ok(value) = pair[0].parse::<f64>() else {
                continue;
            };
            let unit = pair[1];
            let result_name = if i == 0 {
                name.to_string()
            } else {
                format!("{} - {}", name, unit)
            };

            parsed.results.push(MetricResult {
                name: result_name,
                value,
                unit: unit.to_string(),
                extra: extra.clone(),
                package: package.clone(),
                procs,
            });
        }
    }

    if parsed.results.is_empty() {
        return Err(BenchError::parse("no benchmark results found in output"));
    }

    tracing::debug!("Parsed {} benchmark results", parsed.results.len());
    Ok(parsed)
}
