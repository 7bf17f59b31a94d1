// src/changes/diff.rs

//! Changed-file retrieval from version control.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{CiJobsError, Result};

/// What to diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSource {
    /// Changes on `HEAD` since it diverged from this ref.
    BaseRef(String),
    /// Changes of a pull request.
    PullRequest(u64),
}

impl fmt::Display for DiffSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffSource::BaseRef(base) => write!(f, "{base}...HEAD"),
            DiffSource::PullRequest(number) => write!(f, "PR #{number}"),
        }
    }
}

/// Trait abstracting where the list of changed paths comes from.
///
/// Paths are repo-relative and forward-slash separated.
pub trait DiffProvider: Send + Sync {
    fn changed_files<'a>(
        &'a self,
        source: &'a DiffSource,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;
}

/// Production provider: `git diff` for refs, `gh pr diff` for PRs.
#[derive(Debug, Clone)]
pub struct GitDiffProvider {
    repo_dir: PathBuf,
}

impl GitDiffProvider {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    /// Program, arguments and the separator between paths in its output.
    fn command_for(source: &DiffSource) -> (&'static str, Vec<String>, char) {
        match source {
            // `-z` with quotePath off prints paths verbatim, NUL-terminated.
            DiffSource::BaseRef(base) => (
                "git",
                vec![
                    "-c".to_string(),
                    "core.quotePath=false".to_string(),
                    "diff".to_string(),
                    "--name-only".to_string(),
                    "-z".to_string(),
                    format!("{base}...HEAD"),
                ],
                '\0',
            ),
            DiffSource::PullRequest(number) => (
                "gh",
                vec![
                    "pr".to_string(),
                    "diff".to_string(),
                    number.to_string(),
                    "--name-only".to_string(),
                ],
                '\n',
            ),
        }
    }
}

impl DiffProvider for GitDiffProvider {
    fn changed_files<'a>(
        &'a self,
        source: &'a DiffSource,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move {
            let (program, args, separator) = Self::command_for(source);
            let rendered = format!("{program} {}", args.join(" "));
            debug!(command = %rendered, dir = ?self.repo_dir, "retrieving changed files");

            let output = Command::new(program)
                .args(&args)
                .current_dir(&self.repo_dir)
                .output()
                .await
                .map_err(|e| CiJobsError::DiffFailed {
                    command: rendered.clone(),
                    message: e.to_string(),
                })?;

            if !output.status.success() {
                return Err(CiJobsError::DiffFailed {
                    command: rendered,
                    message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }

            Ok(parse_diff_output(
                &String::from_utf8_lossy(&output.stdout),
                separator,
            ))
        })
    }
}

/// Split diff output into paths, dropping empty entries.
///
/// Newline-separated output is trimmed per line; NUL-separated output is
/// taken verbatim.
pub fn parse_diff_output(output: &str, separator: char) -> Vec<String> {
    output
        .split(separator)
        .map(|path| if separator == '\n' { path.trim() } else { path })
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}
