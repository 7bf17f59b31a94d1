#![allow(dead_code)]

use cijobs::config::{
    ConfigFile, ConfigSection, JobSpec, LintJobSpec, ProjectConfig, RawConfigFile, TestJobSpec,
    DEFAULT_TEST_TYPE,
};
use cijobs::dag::ProjectGraph;
use cijobs::jobs::ReportConfig;
use cijobs::test_env::{TestEnvConfig, TestEnvSpec};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                project: Default::default(),
            },
        }
    }

    pub fn with_project(mut self, name: &str, project: ProjectConfig) -> Self {
        self.config.project.insert(name.to_string(), project);
        self
    }

    pub fn with_root(mut self, name: &str) -> Self {
        self.config.config.root = Some(name.to_string());
        self
    }

    pub fn with_lockfile(mut self, path: &str) -> Self {
        self.config.config.lockfile = path.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Build the validated config straight into a graph.
    pub fn graph(self) -> ProjectGraph {
        ProjectGraph::from_config(&self.build())
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ProjectConfig`.
pub struct ProjectBuilder {
    project: ProjectConfig,
}

impl ProjectBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            project: ProjectConfig {
                path: path.to_string(),
                dependencies: vec![],
                job: vec![],
            },
        }
    }

    /// The monorepo root project (empty path).
    pub fn root() -> Self {
        Self::new("")
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.project.dependencies.push(dep.to_string());
        self
    }

    pub fn job(mut self, job: JobSpec) -> Self {
        self.project.job.push(job);
        self
    }

    pub fn build(self) -> ProjectConfig {
        self.project
    }
}

/// Builder for lint `JobSpec`s.
pub struct LintJobBuilder {
    job: LintJobSpec,
}

impl LintJobBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            job: LintJobSpec {
                changes: vec![],
                command: command.to_string(),
                optional: false,
                events: vec![],
            },
        }
    }

    pub fn changes(mut self, pattern: &str) -> Self {
        self.job.changes.push(pattern.to_string());
        self
    }

    pub fn optional(mut self, val: bool) -> Self {
        self.job.optional = val;
        self
    }

    pub fn event(mut self, event: &str) -> Self {
        self.job.events.push(event.to_string());
        self
    }

    pub fn build(self) -> JobSpec {
        JobSpec::Lint(self.job)
    }
}

/// Builder for test `JobSpec`s.
pub struct TestJobBuilder {
    job: TestJobSpec,
}

impl TestJobBuilder {
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            job: TestJobSpec {
                name: name.to_string(),
                test_type: DEFAULT_TEST_TYPE.to_string(),
                changes: vec![],
                command: command.to_string(),
                optional: false,
                events: vec![],
                report: None,
                sharding_arguments: vec![],
                test_env: None,
                only_for_dependencies: None,
            },
        }
    }

    pub fn changes(mut self, pattern: &str) -> Self {
        self.job.changes.push(pattern.to_string());
        self
    }

    pub fn event(mut self, event: &str) -> Self {
        self.job.events.push(event.to_string());
        self
    }

    pub fn test_type(mut self, test_type: &str) -> Self {
        self.job.test_type = test_type.to_string();
        self
    }

    pub fn shard(mut self, argument: &str) -> Self {
        self.job.sharding_arguments.push(argument.to_string());
        self
    }

    pub fn only_for_dependency(mut self, dep: &str) -> Self {
        self.job
            .only_for_dependencies
            .get_or_insert_with(Vec::new)
            .push(dep.to_string());
        self
    }

    pub fn report(mut self, results_blob_name: &str, results_path: &str, allure: bool) -> Self {
        self.job.report = Some(ReportConfig {
            results_blob_name: results_blob_name.to_string(),
            results_path: results_path.to_string(),
            allure,
        });
        self
    }

    pub fn test_env(mut self, start: &str, wp_version: Option<&str>, php_version: Option<&str>) -> Self {
        self.job.test_env = Some(TestEnvSpec {
            start: start.to_string(),
            config: TestEnvConfig {
                wp_version: wp_version.map(str::to_string),
                php_version: php_version.map(str::to_string),
            },
        });
        self
    }

    pub fn build(self) -> JobSpec {
        JobSpec::Test(self.job)
    }
}
