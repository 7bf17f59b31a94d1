// src/lib.rs

pub mod changes;
pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod jobs;
pub mod logging;
pub mod output;
pub mod test_env;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::changes::{get_file_changes, DiffSource, GitDiffProvider, ProjectFileChanges};
use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::dag::ProjectGraph;
use crate::jobs::{create_jobs, CommandVars, CreateOptions, BASE_REF_VAR, EVENT_VAR};
use crate::test_env::WordPressEnvResolver;

/// Variable carrying the pull request number when diffing a PR.
pub const PR_NUMBER_VAR: &str = "prNumber";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - diff retrieval and change attribution
/// - job derivation (with test environment resolution)
/// - JSON / GitHub Actions output
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let graph = ProjectGraph::from_config(&cfg);
    debug!(projects = graph.len(), root = %graph.root().name, "project graph built");

    let changes = match diff_source(&args) {
        Some(source) => {
            let provider = GitDiffProvider::new(&args.repo);
            get_file_changes(&graph, &provider, &source, cfg.lockfile()).await?
        }
        None => ProjectFileChanges::All,
    };

    if args.dry_run {
        print_dry_run(&graph, &changes);
        return Ok(());
    }

    let options = CreateOptions {
        command_vars: command_vars(&args),
    };
    let resolver = WordPressEnvResolver::new()?;
    let jobs = create_jobs(&graph, &changes, &options, &resolver).await?;
    info!(lint = jobs.lint.len(), test = jobs.test.len(), "derived CI jobs");

    crate::output::write_json(&jobs, std::io::stdout().lock())?;

    if args.github_output {
        let path = std::env::var(crate::output::GITHUB_OUTPUT_VAR)
            .context("--github-output given but GITHUB_OUTPUT is not set")?;
        crate::output::append_github_output(&jobs, PathBuf::from(path).as_path())?;
    }

    Ok(())
}

/// `None` when every project should be treated as changed.
fn diff_source(args: &CliArgs) -> Option<DiffSource> {
    if args.all {
        return None;
    }
    match (&args.base_ref, args.pr) {
        (Some(base), _) => Some(DiffSource::BaseRef(base.clone())),
        (None, Some(pr)) => Some(DiffSource::PullRequest(pr)),
        (None, None) => None,
    }
}

/// Command template variables from the CLI. Explicit `--var`s win.
fn command_vars(args: &CliArgs) -> CommandVars {
    let mut vars = CommandVars::new();
    if let Some(base) = &args.base_ref {
        vars.insert(BASE_REF_VAR, base);
    }
    if let Some(pr) = args.pr {
        vars.insert(PR_NUMBER_VAR, pr.to_string());
    }
    if let Some(event) = &args.event {
        vars.insert(EVENT_VAR, event);
    }
    for (key, value) in &args.vars {
        vars.insert(key, value);
    }
    vars
}

/// Simple dry-run output: projects, their paths, jobs and changes.
fn print_dry_run(graph: &ProjectGraph, changes: &ProjectFileChanges) {
    println!("cijobs dry-run");
    println!("  root = {}", graph.root().name);
    println!();

    println!("projects ({}):", graph.len());
    for id in graph.bfs() {
        let node = graph.node(id);
        println!("  - {}", node.name);
        if !node.path.is_empty() {
            println!("      path: {}", node.path);
        }
        let deps: Vec<&str> = graph.dependencies_of(id).map(|d| d.name.as_str()).collect();
        if !deps.is_empty() {
            println!("      dependencies: {:?}", deps);
        }
        if let Some(ci) = &node.ci_config {
            println!("      jobs: {}", ci.jobs.len());
        }
    }
    println!();

    match changes {
        ProjectFileChanges::All => println!("changes: all projects"),
        ProjectFileChanges::Projects(map) => {
            println!("changes ({} projects):", map.len());
            for (name, files) in map {
                println!("  - {name}");
                for file in files {
                    println!("      {file}");
                }
            }
        }
    }

    debug!("dry-run complete (no jobs derived)");
}
