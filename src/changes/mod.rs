// src/changes/mod.rs

//! Changed files and their attribution to projects.
//!
//! - [`diff`] retrieves the raw list of changed paths from version control.
//! - [`attribution`] maps those paths onto the project graph.

pub mod attribution;
pub mod diff;

use std::collections::BTreeMap;

use crate::jobs::rules::ChangeRules;

pub use attribution::{attribute_changes, get_file_changes};
pub use diff::{parse_diff_output, DiffProvider, DiffSource, GitDiffProvider};

/// Files changed per project, or the "everything changed" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectFileChanges {
    /// Every project is treated as fully changed.
    All,
    /// Project name -> changed paths relative to the project directory.
    /// Only projects with at least one file have an entry.
    Projects(BTreeMap<String, Vec<String>>),
}

impl ProjectFileChanges {
    pub fn is_all(&self) -> bool {
        matches!(self, ProjectFileChanges::All)
    }

    /// Changes as seen by one project.
    pub fn for_project(&self, name: &str) -> ProjectChanges<'_> {
        match self {
            ProjectFileChanges::All => ProjectChanges::All,
            ProjectFileChanges::Projects(map) => {
                ProjectChanges::Files(map.get(name).map(Vec::as_slice).unwrap_or(&[]))
            }
        }
    }

    /// Whether `name` has any change attributed to it.
    pub fn has_changes(&self, name: &str) -> bool {
        match self.for_project(name) {
            ProjectChanges::All => true,
            ProjectChanges::Files(files) => !files.is_empty(),
        }
    }

    /// Attributed files of `name`; `None` for the `All` sentinel.
    pub fn files(&self, name: &str) -> Option<&[String]> {
        match self.for_project(name) {
            ProjectChanges::All => None,
            ProjectChanges::Files(files) => Some(files),
        }
    }
}

/// One project's view of the changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectChanges<'a> {
    All,
    Files(&'a [String]),
}

impl ProjectChanges<'_> {
    /// A job with these rules should run: always for `All`, otherwise when
    /// any changed file matches.
    pub fn triggers(&self, rules: &ChangeRules) -> bool {
        match self {
            ProjectChanges::All => true,
            ProjectChanges::Files(files) => rules.matches_any(files),
        }
    }
}
