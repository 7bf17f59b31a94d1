// src/jobs/rules.rs

//! Compiled `changes` trigger patterns.
//!
//! A pattern is either a regex literal in slash form (`/^src\/.*\.ts$/i`) or a
//! glob (`src/**/*.ts`). Regex literal flags `i`, `m` and `s` are honoured;
//! `g`, `y` and `u` carry no meaning for a stateless match and are dropped.
//! Globs are project-relative and never start with `/`.

use std::fmt;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexBuilder};

use crate::errors::{CiJobsError, Result};

const REGEX_LITERAL_FLAGS: &str = "gimsuy";

/// Trigger patterns for one job, matched against project-relative paths.
#[derive(Clone)]
pub struct ChangeRules {
    sources: Vec<String>,
    regexes: Vec<Regex>,
    globs: GlobSet,
}

impl fmt::Debug for ChangeRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRules")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

impl Default for ChangeRules {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            regexes: Vec::new(),
            globs: GlobSet::empty(),
        }
    }
}

impl ChangeRules {
    /// Compile a list of pattern strings.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut sources = Vec::with_capacity(patterns.len());
        let mut regexes = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            sources.push(pattern.to_string());

            match split_regex_literal(pattern) {
                Some((body, flags)) => regexes.push(build_regex(pattern, body, flags)?),
                None => {
                    let glob = Glob::new(pattern).map_err(|e| invalid(pattern, e))?;
                    builder.add(glob);
                }
            }
        }

        let globs = builder.build().map_err(|e| invalid(&sources.join(", "), e))?;

        Ok(Self {
            sources,
            regexes,
            globs,
        })
    }

    /// Returns true if `rel_path` (relative to the owning project) matches
    /// any pattern.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.regexes.iter().any(|re| re.is_match(rel_path)) || self.globs.is_match(rel_path)
    }

    /// Returns true if any of the given paths matches.
    pub fn matches_any<S: AsRef<str>>(&self, rel_paths: &[S]) -> bool {
        rel_paths.iter().any(|p| self.matches(p.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The patterns as written in the config.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

/// Split `/body/flags` into its parts. Returns `None` for anything that is
/// not a regex literal.
fn split_regex_literal(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    if body.is_empty() || !flags.chars().all(|c| REGEX_LITERAL_FLAGS.contains(c)) {
        return None;
    }
    Some((body, flags))
}

fn build_regex(pattern: &str, body: &str, flags: &str) -> Result<Regex> {
    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            // g / y / u
            _ => {}
        }
    }
    builder.build().map_err(|e| invalid(pattern, e))
}

fn invalid(pattern: &str, err: impl fmt::Display) -> CiJobsError {
    CiJobsError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    }
}
