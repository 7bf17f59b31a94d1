// src/output.rs

//! Hand-off of derived jobs to the CI orchestrator.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::errors::{Error, Result};
use crate::jobs::Jobs;

/// Environment variable GitHub Actions uses for step outputs.
pub const GITHUB_OUTPUT_VAR: &str = "GITHUB_OUTPUT";

/// Write `{"lint": [...], "test": [...]}` followed by a newline.
pub fn write_json(jobs: &Jobs, mut out: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, jobs).map_err(Error::from)?;
    writeln!(out)?;
    Ok(())
}

/// Append `lint-jobs=<json>` and `test-jobs=<json>` lines to a GitHub
/// Actions output file.
pub fn append_github_output(jobs: &Jobs, path: &Path) -> Result<()> {
    let lint = serde_json::to_string(&jobs.lint).map_err(Error::from)?;
    let test = serde_json::to_string(&jobs.test).map_err(Error::from)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    writeln!(file, "lint-jobs={lint}")?;
    writeln!(file, "test-jobs={test}")?;
    Ok(())
}
