// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::model::{ConfigFile, JobSpec, ProjectDef, RawConfigFile};
use crate::errors::{CiJobsError, Result};
use crate::jobs::model::JobConfig;
use crate::test_env::WpVersionRequest;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CiJobsError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let root = resolve_root(&raw)?;
        let projects = compile_projects(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, root, projects))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_projects(cfg)?;
    validate_project_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_jobs(cfg)?;
    warn_on_multiple_root_paths(cfg);
    Ok(())
}

fn ensure_has_projects(cfg: &RawConfigFile) -> Result<()> {
    if cfg.project.is_empty() {
        return Err(CiJobsError::ConfigError(
            "config must contain at least one [project.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_project_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, project) in cfg.project.iter() {
        for dep in project.dependencies.iter() {
            if !cfg.project.contains_key(dep) {
                return Err(CiJobsError::ConfigError(format!(
                    "project '{}' has unknown dependency '{}'",
                    name, dep
                )));
            }
            if dep == name {
                return Err(CiJobsError::ConfigError(format!(
                    "project '{}' cannot depend on itself",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.project.keys() {
        graph.add_node(name.as_str());
    }

    for (name, project) in cfg.project.iter() {
        for dep in project.dependencies.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(CiJobsError::DagCycle(format!(
                "cycle detected in project graph involving project '{}'",
                node
            )))
        }
    }
}

fn validate_jobs(cfg: &RawConfigFile) -> Result<()> {
    for (name, project) in cfg.project.iter() {
        for (index, job) in project.job.iter().enumerate() {
            let JobSpec::Test(test) = job else {
                continue;
            };
            if test.name.trim().is_empty() {
                return Err(CiJobsError::ConfigError(format!(
                    "test job #{index} of project '{name}' has an empty name"
                )));
            }
            if let Some(raw) = test
                .test_env
                .as_ref()
                .and_then(|env| env.config.wp_version.as_deref())
            {
                WpVersionRequest::parse(raw).map_err(|e| {
                    CiJobsError::ConfigError(format!(
                        "test job '{}' of project '{}': {}",
                        test.name, name, e
                    ))
                })?;
            }
            for dep in test.only_for_dependencies.iter().flatten() {
                if !project.dependencies.contains(dep) {
                    return Err(CiJobsError::ConfigError(format!(
                        "test job '{}' of project '{}' lists '{}' in only_for_dependencies, which is not a dependency",
                        test.name, name, dep
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Only the first empty-path project collects orphaned files.
fn warn_on_multiple_root_paths(cfg: &RawConfigFile) {
    let empty: Vec<&str> = cfg
        .project
        .iter()
        .filter(|(_, p)| crate::dag::normalize_path(&p.path).is_empty())
        .map(|(name, _)| name.as_str())
        .collect();
    if empty.len() > 1 {
        warn!(
            projects = ?empty,
            "several projects have an empty path; only one receives files outside every project"
        );
    }
}

fn resolve_root(cfg: &RawConfigFile) -> Result<String> {
    if let Some(root) = &cfg.config.root {
        if !cfg.project.contains_key(root) {
            return Err(CiJobsError::ProjectNotFound(format!(
                "[config].root names unknown project '{root}'"
            )));
        }
        return Ok(root.clone());
    }

    let depended_on: HashSet<&str> = cfg
        .project
        .values()
        .flat_map(|p| p.dependencies.iter().map(String::as_str))
        .collect();
    let candidates: Vec<&String> = cfg
        .project
        .keys()
        .filter(|name| !depended_on.contains(name.as_str()))
        .collect();

    match candidates.as_slice() {
        [root] => Ok((*root).clone()),
        _ => Err(CiJobsError::ConfigError(format!(
            "cannot infer the root project (candidates: {:?}); set [config].root",
            candidates
        ))),
    }
}

fn compile_projects(cfg: &RawConfigFile) -> Result<BTreeMap<String, ProjectDef>> {
    cfg.project
        .iter()
        .map(|(name, project)| {
            let jobs = project
                .job
                .iter()
                .map(JobConfig::try_from)
                .collect::<Result<Vec<_>>>()?;
            Ok((
                name.clone(),
                ProjectDef {
                    path: project.path.clone(),
                    dependencies: project.dependencies.clone(),
                    jobs,
                },
            ))
        })
        .collect()
}
