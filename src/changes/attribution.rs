// src/changes/attribution.rs

//! Attribute changed files to the projects they belong to.
//!
//! Attribution runs in three passes over the project graph:
//!
//! 1. **Ownership**: a file belongs to the deepest project whose path is a
//!    directory prefix of it. Each file is claimed at most once.
//! 2. **Orphans**: files no project owns go to the monorepo root project
//!    (the first project with an empty path), if there is one.
//! 3. **Pattern claims**: a project with CI config also receives any file
//!    under its directory that matches one of its job patterns, even when a
//!    nested project already owns that file.

use std::collections::BTreeMap;

use tracing::debug;

use crate::changes::diff::{DiffProvider, DiffSource};
use crate::changes::ProjectFileChanges;
use crate::dag::ProjectGraph;
use crate::errors::Result;

/// Retrieve the changed files for `source` and attribute them.
pub async fn get_file_changes(
    graph: &ProjectGraph,
    provider: &dyn DiffProvider,
    source: &DiffSource,
    lockfile: &str,
) -> Result<ProjectFileChanges> {
    let files = provider.changed_files(source).await?;
    debug!(%source, count = files.len(), "retrieved changed files");
    Ok(attribute_changes(graph, &files, lockfile))
}

/// Map `changed_files` (repo-relative) onto the projects of `graph`.
///
/// A change to `lockfile` can affect any project, so it yields
/// [`ProjectFileChanges::All`] without looking at anything else.
pub fn attribute_changes<S: AsRef<str>>(
    graph: &ProjectGraph,
    changed_files: &[S],
    lockfile: &str,
) -> ProjectFileChanges {
    let all_files: Vec<&str> = changed_files.iter().map(|f| f.as_ref()).collect();

    if all_files.iter().any(|f| *f == lockfile) {
        debug!(lockfile, "lockfile changed; treating every project as changed");
        return ProjectFileChanges::All;
    }

    let mut changes: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let unclaimed = claim_by_path(graph, &all_files, &mut changes);
    assign_orphans(graph, unclaimed, &mut changes);
    claim_by_ci_patterns(graph, &all_files, &mut changes);

    ProjectFileChanges::Projects(changes)
}

/// `file` relative to `dir`, if it lies inside it.
fn relative_to<'f>(dir: &str, file: &'f str) -> Option<&'f str> {
    file.strip_prefix(dir)?.strip_prefix('/')
}

/// Pass 1. Returns the files nobody owns.
fn claim_by_path<'f>(
    graph: &ProjectGraph,
    files: &[&'f str],
    changes: &mut BTreeMap<String, Vec<String>>,
) -> Vec<&'f str> {
    // Deepest path first, so nested projects win over their ancestors.
    let projects: Vec<(&str, &str)> = graph
        .by_path_depth()
        .into_iter()
        .map(|id| graph.node(id))
        .map(|node| (node.name.as_str(), node.path.as_str()))
        .collect();

    let mut remaining: Vec<&'f str> = files.to_vec();

    for (name, path) in projects.into_iter().filter(|(_, path)| !path.is_empty()) {
        let mut owned = Vec::new();
        remaining.retain(|file| match relative_to(path, file) {
            Some(rel) => {
                owned.push(rel.to_string());
                false
            }
            None => true,
        });

        if !owned.is_empty() {
            debug!(project = name, files = owned.len(), "claimed files by path");
            changes.entry(name.to_string()).or_default().extend(owned);
        }
    }

    remaining
}

/// Pass 2.
fn assign_orphans(
    graph: &ProjectGraph,
    orphans: Vec<&str>,
    changes: &mut BTreeMap<String, Vec<String>>,
) {
    if orphans.is_empty() {
        return;
    }

    let root = graph
        .bfs()
        .into_iter()
        .map(|id| graph.node(id))
        .find(|node| node.path.is_empty());

    match root {
        Some(node) => {
            debug!(project = %node.name, files = orphans.len(), "assigned orphaned files");
            changes
                .entry(node.name.clone())
                .or_default()
                .extend(orphans.into_iter().map(str::to_string));
        }
        None => {
            debug!(files = ?orphans, "no root project; dropping files outside every project");
        }
    }
}

/// Pass 3.
fn claim_by_ci_patterns(
    graph: &ProjectGraph,
    files: &[&str],
    changes: &mut BTreeMap<String, Vec<String>>,
) {
    for id in graph.bfs() {
        let node = graph.node(id);
        let Some(ci) = &node.ci_config else {
            continue;
        };
        if node.path.is_empty() {
            continue;
        }

        for file in files {
            let Some(rel) = relative_to(&node.path, file) else {
                continue;
            };
            if !ci.jobs.iter().any(|job| job.changes().matches(rel)) {
                continue;
            }

            let list = changes.entry(node.name.clone()).or_default();
            if !list.iter().any(|f| f == rel) {
                debug!(project = %node.name, file = rel, "claimed file by CI pattern");
                list.push(rel.to_string());
            }
        }
    }
}
