// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::jobs::model::{JobConfig, ReportConfig};
use crate::test_env::TestEnvSpec;

/// Default lockfile whose modification marks every project as changed.
pub const DEFAULT_LOCKFILE: &str = "pnpm-lock.yaml";

/// Default `test_type` for test jobs that don't declare one.
pub const DEFAULT_TEST_TYPE: &str = "e2e";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// root = "monorepo"
///
/// [project.monorepo]
/// path = ""
/// dependencies = ["core"]
///
/// [project.core]
/// path = "plugins/core"
///
/// [[project.core.job]]
/// type = "lint"
/// changes = ['/^src\/.*\.php$/']
/// command = "pnpm lint --base <baseRef>"
/// ```
///
/// This is the unvalidated form; see [`ConfigFile`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All projects from `[project.<name>]`, keyed by project name.
    #[serde(default)]
    pub project: BTreeMap<String, ProjectConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Name of the project the dependency walk starts from.
    ///
    /// When omitted, the single project that no other project depends on is
    /// used.
    #[serde(default)]
    pub root: Option<String>,

    /// Repo-relative path of the root lockfile.
    #[serde(default = "default_lockfile")]
    pub lockfile: String,
}

fn default_lockfile() -> String {
    DEFAULT_LOCKFILE.to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            root: None,
            lockfile: default_lockfile(),
        }
    }
}

/// `[project.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Repository-relative directory. Empty for the monorepo root project.
    #[serde(default)]
    pub path: String,

    /// Names of the projects this one depends on, in walk order.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// CI job definitions from `[[project.<name>.job]]`.
    #[serde(default)]
    pub job: Vec<JobSpec>,
}

/// A `[[project.<name>.job]]` entry, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobSpec {
    Lint(LintJobSpec),
    Test(TestJobSpec),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LintJobSpec {
    /// Trigger patterns (regex literals `/.../flags` or globs), matched
    /// against project-relative paths.
    #[serde(default)]
    pub changes: Vec<String>,

    /// Command template; `<var>` tokens are substituted at derivation time.
    pub command: String,

    #[serde(default)]
    pub optional: bool,

    /// Events this job runs for. Empty means every event.
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestJobSpec {
    /// Display name of the job.
    pub name: String,

    #[serde(default = "default_test_type")]
    pub test_type: String,

    #[serde(default)]
    pub changes: Vec<String>,

    pub command: String,

    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub events: Vec<String>,

    /// Result artifact settings.
    #[serde(default)]
    pub report: Option<ReportConfig>,

    /// One job is produced per entry when more than one is given.
    #[serde(default)]
    pub sharding_arguments: Vec<String>,

    /// Test environment to create before running the job.
    #[serde(default)]
    pub test_env: Option<TestEnvSpec>,

    /// Restrict "a dependency changed" triggering to these dependencies.
    #[serde(default)]
    pub only_for_dependencies: Option<Vec<String>>,
}

fn default_test_type() -> String {
    DEFAULT_TEST_TYPE.to_string()
}

/// A validated project definition with compiled job configs.
#[derive(Debug, Clone)]
pub struct ProjectDef {
    pub path: String,
    pub dependencies: Vec<String>,
    pub jobs: Vec<JobConfig>,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>`, which guarantees that
/// dependencies resolve, the project graph is acyclic, the root exists and
/// every change pattern compiles.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    root: String,
    projects: BTreeMap<String, ProjectDef>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        root: String,
        projects: BTreeMap<String, ProjectDef>,
    ) -> Self {
        Self {
            config,
            root,
            projects,
        }
    }

    /// Path of the lockfile that forces a full run.
    pub fn lockfile(&self) -> &str {
        &self.config.lockfile
    }

    /// Name of the project the dependency walk starts from.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn projects(&self) -> &BTreeMap<String, ProjectDef> {
        &self.projects
    }
}
