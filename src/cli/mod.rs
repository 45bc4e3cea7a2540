//! Command-line interface for benchtrail.
//!
//! Three subcommands cover the continuous-benchmarking workflow:
//! `parse` turns raw benchmark output into an `entry.json`, `store` merges
//! entries into the history, and `show` prints what the store holds.

use crate::core::config::{Config, ConfigBuilder};
use crate::core::{BenchError, Entry, IoOp, Result, RunParameters};
use crate::parse::parse_go_bench;
use crate::storage::files::{ensure_dir, write_json};
use crate::storage::EntryStore;
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Continuous benchmark history for static dashboards
#[derive(Parser, Debug)]
#[command(name = "benchtrail")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/benchtrail/config.yaml)
    #[arg(short, long, env = "BENCHTRAIL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = "BENCHTRAIL_DEBUG", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse `go test -bench` output into an entry file
    Parse(ParseArgs),
    /// Merge entry files into a branch history
    Store(StoreArgs),
    /// Print stored data as JSON
    Show(ShowArgs),
}

#[derive(Args, Debug, Default)]
pub struct ParseArgs {
    /// Benchmark output file (reads stdin when omitted)
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Directory receiving entry.json and output.log
    #[arg(long, default_value = "benchmark-result")]
    pub result_dir: PathBuf,

    /// Commit SHA
    #[arg(long)]
    pub commit_sha: String,

    /// Commit message (only the first line is kept)
    #[arg(long, default_value = "")]
    pub commit_msg: String,

    #[arg(long, default_value = "")]
    pub commit_author: String,

    /// Commit date in RFC 3339 (defaults to now)
    #[arg(long)]
    pub commit_date: Option<String>,

    #[arg(long, default_value = "")]
    pub commit_url: String,

    /// CPU model (taken from the output's `cpu:` line when omitted)
    #[arg(long)]
    pub cpu_model: Option<String>,

    /// Native-code bridging: true, false, 1 or 0 (auto-detect when omitted)
    #[arg(long)]
    pub cgo: Option<String>,

    /// Toolchain version, e.g. go1.22.0
    #[arg(long, env = "BENCHTRAIL_TOOLCHAIN")]
    pub toolchain: Option<String>,

    /// Operating system (defaults to the host's)
    #[arg(long)]
    pub os: Option<String>,

    /// CPU architecture (defaults to the host's)
    #[arg(long)]
    pub arch: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct StoreArgs {
    /// Comma- or newline-separated entry.json paths
    #[arg(long)]
    pub entries: String,

    /// Branch or release tag the entries belong to
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Store root directory
    #[arg(long, env = "BENCHTRAIL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Maximum entries per branch (0 = unlimited)
    #[arg(long, env = "BENCHTRAIL_MAX_ITEMS")]
    pub max_items: Option<usize>,

    /// Repository URL for the dashboard header
    #[arg(long, env = "BENCHTRAIL_REPO_URL")]
    pub repo_url: Option<String>,

    /// Module identifier stripped from package names
    #[arg(long, alias = "go-module")]
    pub module_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Store root directory
    #[arg(long, env = "BENCHTRAIL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub target: ShowTarget,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShowTarget {
    /// Known branch names
    Catalog,
    /// Stored entries of one branch
    History { branch: String },
    /// Commit SHA to release tag map
    Tags,
    /// Repository metadata
    Metadata,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = match &self.config {
            Some(path) => Some(path.clone()),
            None => dirs::config_dir()
                .map(|d| d.join("benchtrail").join("config.yaml"))
                .filter(|p| p.exists()),
        };

        if let Some(path) = config_path {
            match fs::read_to_string(&path) {
                Ok(content) => builder = builder.from_yaml(&content)?,
                Err(e) => {
                    return Err(BenchError::config(format!(
                        "Failed to read config file {:?}: {}",
                        path, e
                    )));
                },
            }
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        let (data_dir, repo_url, module_id) = match &self.command {
            Command::Store(args) => {
                if let Some(max) = args.max_items {
                    builder = builder.max_items(max);
                }
                (&args.data_dir, &args.repo_url, &args.module_id)
            },
            Command::Show(args) => (&args.data_dir, &None, &None),
            Command::Parse(_) => (&None, &None, &None),
        };

        if let Some(dir) = data_dir {
            builder = builder.data_dir(dir.clone());
        }
        if let Some(url) = repo_url {
            builder = builder.repo_url(url.clone());
        }
        if let Some(module) = module_id {
            builder = builder.module_id(module.clone());
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self, config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level = std::env::var("BENCHTRAIL_LOG_LEVEL")
            .unwrap_or_else(|_| config.logging.level.as_str().to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.logging.structured)
            .with_line_number(config.logging.structured)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| BenchError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute a parsed command line.
pub fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    cli.init_logging(&config)?;
    tracing::debug!("Using store at {}", config.storage.data_dir.display());

    match &cli.command {
        Command::Parse(args) => run_parse(args, &config),
        Command::Store(args) => run_store(args, &config),
        Command::Show(args) => run_show(&args.target, &config),
    }
}

fn run_parse(args: &ParseArgs, config: &Config) -> Result<()> {
    if args.commit_sha.trim().is_empty() {
        return Err(BenchError::invalid_entry("--commit-sha is required"));
    }

    let raw = match &args.output_file {
        Some(path) => fs::read_to_string(path).map_err(|e| BenchError::io(IoOp::Read, path, e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| BenchError::io(IoOp::Read, "<stdin>", e))?;
            buf
        },
    };

    let entry = build_entry(args, &raw, Utc::now())?;
    println!("Parsed {} benchmark result(s)", entry.benchmarks.len());
    for metric in &entry.benchmarks {
        println!("  {}: {:.4} {}", metric.name, metric.value, metric.unit);
    }

    ensure_dir(&args.result_dir)?;
    let entry_path = args.result_dir.join("entry.json");
    write_json(&entry_path, &entry, config.storage.write_mode())?;
    println!("Wrote parsed entry to {}", entry_path.display());

    let log_path = args.result_dir.join("output.log");
    fs::write(&log_path, &raw).map_err(|e| BenchError::io(IoOp::Write, &log_path, e))?;
    println!("Wrote raw output to {}", log_path.display());

    println!("artifact-name: {}", entry.params.artifact_name());
    Ok(())
}

/// Builds the entry for one benchmark run from raw output and commit flags.
pub fn build_entry(args: &ParseArgs, raw: &str, now: DateTime<Utc>) -> Result<Entry> {
    let parsed = parse_go_bench(raw)?;

    let commit_date = args
        .commit_date
        .clone()
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Secs, true));
    let timestamp = DateTime::parse_from_rfc3339(&commit_date)
        .map_err(|e| BenchError::invalid_entry(format!("commit date {:?}: {}", commit_date, e)))?
        .timestamp_millis();

    let cpu = args
        .cpu_model
        .clone()
        .filter(|c| !c.is_empty())
        .or(parsed.cpu)
        .unwrap_or_else(|| "unknown".to_string());
    let cgo_env = std::env::var("CGO_ENABLED").ok();

    let params = RunParameters {
        cpu,
        os: args.os.clone().unwrap_or_else(host_os),
        arch: args.arch.clone().unwrap_or_else(host_arch),
        toolchain: args.toolchain.clone().unwrap_or_default(),
        cgo: detect_cgo(args.cgo.as_deref(), cgo_env.as_deref()),
    };

    Entry::builder()
        .sha(args.commit_sha.trim())
        .message(first_line(&args.commit_msg))
        .author(args.commit_author.as_str())
        .commit_date(commit_date)
        .url(args.commit_url.as_str())
        .timestamp(timestamp)
        .params(params)
        .metrics(parsed.results)
        .build()
}

fn run_store(args: &StoreArgs, config: &Config) -> Result<()> {
    let paths = split_entry_paths(&args.entries);
    if paths.is_empty() {
        return Err(BenchError::config("--entries names no files"));
    }

    let entries = paths
        .iter()
        .map(|path| load_entry(path))
        .collect::<Result<Vec<_>>>()?;
    for (path, entry) in paths.iter().zip(&entries) {
        tracing::info!(
            "Loaded {} ({}, {} benchmarks)",
            path.display(),
            entry.params.artifact_name(),
            entry.benchmarks.len()
        );
    }

    let store = EntryStore::from_config(&config.storage)?;
    let outcome = store.append_entries(&args.branch, &entries, config.storage.max_items)?;
    let short_sha = entries
        .first()
        .map(|e| e.commit.short_sha())
        .unwrap_or_default();
    println!(
        "Stored {} entries for branch {:?} (commit {}), {} in history",
        entries.len(),
        args.branch,
        short_sha,
        outcome.merge.branch.total
    );

    let repo_url = config.repository.repo_url.clone().unwrap_or_default();
    let module_id = config
        .repository
        .module_id
        .clone()
        .or_else(|| detect_module_id(Path::new("go.mod"), &repo_url));
    if !repo_url.is_empty() || module_id.is_some() {
        store.write_metadata(&repo_url, module_id.as_deref())?;
    }

    Ok(())
}

fn run_show(target: &ShowTarget, config: &Config) -> Result<()> {
    let store = EntryStore::from_config(&config.storage)?;
    let json = match target {
        ShowTarget::Catalog => serde_json::to_string_pretty(&store.read_catalog()?)?,
        ShowTarget::History { branch } => {
            serde_json::to_string_pretty(&store.read_branch_history(branch)?)?
        },
        ShowTarget::Tags => serde_json::to_string_pretty(&store.read_release_tags()?)?,
        ShowTarget::Metadata => serde_json::to_string_pretty(&store.read_metadata()?)?,
    };
    println!("{}", json);
    Ok(())
}

/// Reads one entry file written by `parse`.
pub fn load_entry(path: &Path) -> Result<Entry> {
    let data = fs::read_to_string(path).map_err(|e| BenchError::io(IoOp::Read, path, e))?;
    serde_json::from_str(&data).map_err(|e| BenchError::decode(path, e))
}

/// Splits a comma- or newline-separated path list, dropping blanks.
pub fn split_entry_paths(raw: &str) -> Vec<PathBuf> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

pub fn first_line(s: &str) -> &str {
    s.split('\n').next().unwrap_or_default()
}

/// Explicit flag value, else `CGO_ENABLED=0` disables, else enabled.
pub fn detect_cgo(flag: Option<&str>, env_value: Option<&str>) -> bool {
    match flag.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => env_value.map(str::trim) != Some("0"),
    }
}

/// Module identifier from the `module` line of a go.mod file, else the
/// repository URL without scheme and `.git` suffix.
pub fn detect_module_id(go_mod: &Path, repo_url: &str) -> Option<String> {
    if let Some(module) = fs::read_to_string(go_mod)
        .ok()
        .and_then(|content| parse_module_line(&content))
    {
        return Some(module);
    }

    let trimmed = repo_url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    ["https://", "http://"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

fn parse_module_line(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("module "))
        .map(|module| module.trim().to_string())
        .filter(|module| !module.is_empty())
}

fn host_os() -> String {
    std::env::consts::OS.to_string()
}

// Architecture names as the Go toolchain spells them.
fn host_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        other => other,
    }
    .to_string()
}
