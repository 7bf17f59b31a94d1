// src/jobs/deriver.rs

//! Derive concrete lint and test jobs from attributed changes.
//!
//! The walk is depth-first and post-order: a project's dependencies produce
//! their jobs before the project itself is considered, so "a dependency
//! changed" is known when the project's test jobs are evaluated. A project
//! shared by several dependents is walked once; every dependent sees the
//! same changed/unchanged answer.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::changes::{ProjectChanges, ProjectFileChanges};
use crate::dag::{NodeId, ProjectGraph, ProjectNode};
use crate::errors::Result;
use crate::jobs::command::{substitute, CommandVars};
use crate::jobs::job::{expand_shards, Jobs, LintJob, ResolvedTestEnv, TestJob};
use crate::jobs::model::{CommonJobConfig, JobConfig, TestJobConfig};
use crate::test_env::{TestEnvResolver, WP_VERSION};

/// Options for a derivation run.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Values for `<var>` tokens in job commands. `event` also drives
    /// `events` filtering.
    pub command_vars: CommandVars,
}

/// Stable identity of a job definition: the project and the job's index in
/// its CI config.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub project: String,
    pub index: usize,
}

impl JobKey {
    pub fn new(project: impl Into<String>, index: usize) -> Self {
        Self {
            project: project.into(),
            index,
        }
    }
}

/// Derive every job `changes` calls for, starting at the graph root.
///
/// Each job definition produces at most one job (before sharding), even when
/// its project is reachable through several dependency paths.
pub async fn create_jobs(
    graph: &ProjectGraph,
    changes: &ProjectFileChanges,
    options: &CreateOptions,
    resolver: &dyn TestEnvResolver,
) -> Result<Jobs> {
    let mut deriver = JobDeriver {
        graph,
        changes,
        options,
        resolver,
        created: HashSet::new(),
        visited: HashMap::new(),
    };
    deriver.walk(graph.root_id()).await
}

/// What happened to one test job definition.
enum TestOutcome {
    NotTriggered,
    /// Triggered, but the requested pre-release environment is unavailable.
    Suppressed,
    Created(Vec<TestJob>),
}

struct JobDeriver<'a> {
    graph: &'a ProjectGraph,
    changes: &'a ProjectFileChanges,
    options: &'a CreateOptions,
    resolver: &'a dyn TestEnvResolver,
    created: HashSet<JobKey>,
    /// Whether each walked project counts as changed for its dependents.
    visited: HashMap<NodeId, bool>,
}

impl<'a> JobDeriver<'a> {
    fn walk(&mut self, id: NodeId) -> Pin<Box<dyn Future<Output = Result<Jobs>> + Send + '_>> {
        Box::pin(async move {
            let graph = self.graph;
            let changes = self.changes;
            let options = self.options;
            let node = graph.node(id);
            let mut jobs = Jobs::default();

            let mut changed_dependencies: Vec<&'a str> = Vec::new();
            for &dep_id in &node.dependencies {
                // A second visit would create nothing new; reuse the first answer.
                let dep_changed = match self.visited.get(&dep_id).copied() {
                    Some(changed) => changed,
                    None => {
                        let dep_jobs = self.walk(dep_id).await?;
                        let changed = self.visited.get(&dep_id).copied().unwrap_or(false);
                        jobs.extend(dep_jobs);
                        changed
                    }
                };
                if dep_changed {
                    changed_dependencies.push(graph.node(dep_id).name.as_str());
                }
            }

            let Some(ci) = &node.ci_config else {
                self.visited.insert(id, changes.has_changes(&node.name) || !jobs.is_empty());
                return Ok(jobs);
            };

            let event = options.command_vars.event();
            for (index, job_config) in ci.jobs.iter().enumerate() {
                let key = JobKey::new(&node.name, index);
                if self.created.contains(&key) {
                    debug!(project = %node.name, index, "job already created on another path");
                    continue;
                }
                if !job_config.accepts_event(event) {
                    debug!(project = %node.name, index, ?event, "job not configured for event");
                    continue;
                }

                let project_changes = changes.for_project(&node.name);

                match job_config {
                    JobConfig::Lint(lint) => {
                        let created = self.create_lint_job(node, lint, project_changes)?;
                        if let Some(job) = created {
                            self.created.insert(key);
                            jobs.lint.push(job);
                        }
                    }
                    JobConfig::Test(test) => {
                        let outcome = self
                            .create_test_jobs(node, test, project_changes, &changed_dependencies)
                            .await?;
                        match outcome {
                            TestOutcome::NotTriggered => {}
                            TestOutcome::Suppressed => {
                                self.created.insert(key);
                            }
                            TestOutcome::Created(created) => {
                                self.created.insert(key);
                                jobs.test.extend(created);
                            }
                        }
                    }
                }
            }

            self.visited.insert(id, changes.has_changes(&node.name) || !jobs.is_empty());
            Ok(jobs)
        })
    }

    fn create_lint_job(
        &self,
        node: &ProjectNode,
        config: &CommonJobConfig,
        changes: ProjectChanges<'_>,
    ) -> Result<Option<LintJob>> {
        if !changes.triggers(&config.changes) {
            return Ok(None);
        }

        let command = substitute(&config.command, &self.options.command_vars)?;
        debug!(project = %node.name, %command, "lint job triggered");

        Ok(Some(LintJob {
            project_name: node.name.clone(),
            project_path: node.path.clone(),
            command,
            optional: config.optional,
        }))
    }

    async fn create_test_jobs(
        &self,
        node: &ProjectNode,
        config: &TestJobConfig,
        mut changes: ProjectChanges<'_>,
        changed_dependencies: &[&str],
    ) -> Result<TestOutcome> {
        if dependency_escalates(config, changed_dependencies) {
            changes = ProjectChanges::All;
        }
        if !changes.triggers(&config.common.changes) {
            return Ok(TestOutcome::NotTriggered);
        }

        let command = substitute(&config.common.command, &self.options.command_vars)?;
        let mut job = TestJob {
            project_name: node.name.clone(),
            project_path: node.path.clone(),
            name: config.name.clone(),
            command,
            test_env: ResolvedTestEnv::default(),
            shard_number: 0,
            test_type: config.test_type.clone(),
            report: config.report.clone(),
            optional: config.common.optional,
        };

        if let Some(spec) = &config.test_env {
            let env_vars = self.resolver.resolve(&spec.config).await?;

            if spec.config.requests_prerelease() && !env_vars.contains_key(WP_VERSION) {
                warn!(
                    project = %node.name,
                    job = %config.name,
                    wp_version = ?spec.config.wp_version,
                    "no pre-release version available; skipping job"
                );
                return Ok(TestOutcome::Suppressed);
            }

            if let Some(version) = env_vars.get(WP_VERSION) {
                job.name = format!("{} [WP {version}]", job.name);
            }

            job.test_env = ResolvedTestEnv {
                should_create: true,
                env_vars,
                start: Some(spec.start.clone()),
            };
        }

        debug!(project = %node.name, job = %job.name, "test job triggered");
        Ok(TestOutcome::Created(expand_shards(
            job,
            &config.sharding_arguments,
        )))
    }
}

/// Whether changed dependencies force `config` to run.
fn dependency_escalates(config: &TestJobConfig, changed_dependencies: &[&str]) -> bool {
    if changed_dependencies.is_empty() {
        return false;
    }
    match &config.only_for_dependencies {
        Some(only) => changed_dependencies
            .iter()
            .any(|dep| only.iter().any(|o| o == dep)),
        None => true,
    }
}
