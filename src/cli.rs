// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{ArgGroup, Parser, ValueEnum};

/// Command-line arguments for `cijobs`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cijobs",
    version,
    about = "Compute the lint and test jobs a monorepo change needs.",
    long_about = None
)]
#[command(group(
    ArgGroup::new("source")
        .args(["base_ref", "pr", "all"])
        .required(true)
))]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "cijobs.toml")]
    pub config: String,

    /// Git ref to diff against (`git diff <REF>...HEAD`).
    #[arg(long, value_name = "REF")]
    pub base_ref: Option<String>,

    /// Pull request number to diff (`gh pr diff <N>`).
    #[arg(long, value_name = "N")]
    pub pr: Option<u64>,

    /// Treat every project as changed.
    #[arg(long)]
    pub all: bool,

    /// Triggering CI event (e.g. `pull_request`, `push`).
    ///
    /// Jobs restricted to other events are skipped; also available to
    /// commands as `<event>`.
    #[arg(long, value_name = "NAME")]
    pub event: Option<String>,

    /// Extra command template variable, e.g. `--var branch=trunk`.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Append `lint-jobs=` / `test-jobs=` lines to `$GITHUB_OUTPUT`.
    #[arg(long)]
    pub github_output: bool,

    /// Print the project graph and attributed changes, but derive no jobs.
    #[arg(long)]
    pub dry_run: bool,

    /// Working directory the diff command runs in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub repo: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CIJOBS_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
