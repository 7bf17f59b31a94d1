// src/jobs/model.rs

//! Compiled job definitions, as attached to project nodes.

use serde::{Deserialize, Serialize};

use crate::config::model::{JobSpec, LintJobSpec, TestJobSpec};
use crate::errors::Result;
use crate::jobs::rules::ChangeRules;
use crate::test_env::TestEnvSpec;

/// Result artifact settings of a test job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    #[serde(default, alias = "results_blob_name")]
    pub results_blob_name: String,

    #[serde(default, alias = "results_path")]
    pub results_path: String,

    /// Whether results are collected in allure format.
    #[serde(default)]
    pub allure: bool,
}

/// Fields shared by lint and test jobs.
#[derive(Debug, Clone)]
pub struct CommonJobConfig {
    pub changes: ChangeRules,
    pub command: String,
    pub optional: bool,
    pub events: Vec<String>,
}

impl CommonJobConfig {
    fn compile(changes: &[String], command: &str, optional: bool, events: &[String]) -> Result<Self> {
        Ok(Self {
            changes: ChangeRules::compile(changes)?,
            command: command.to_string(),
            optional,
            events: events.to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TestJobConfig {
    pub common: CommonJobConfig,
    pub name: String,
    pub test_type: String,
    pub report: Option<ReportConfig>,
    pub sharding_arguments: Vec<String>,
    pub test_env: Option<TestEnvSpec>,
    pub only_for_dependencies: Option<Vec<String>>,
}

/// A CI job definition of a project.
#[derive(Debug, Clone)]
pub enum JobConfig {
    Lint(CommonJobConfig),
    Test(TestJobConfig),
}

impl JobConfig {
    pub fn common(&self) -> &CommonJobConfig {
        match self {
            JobConfig::Lint(common) => common,
            JobConfig::Test(test) => &test.common,
        }
    }

    pub fn changes(&self) -> &ChangeRules {
        &self.common().changes
    }

    /// Whether this job runs for `event`.
    ///
    /// Jobs without an `events` list run for every event. Jobs with one are
    /// skipped when the event is unknown.
    pub fn accepts_event(&self, event: Option<&str>) -> bool {
        let events = &self.common().events;
        if events.is_empty() {
            return true;
        }
        match event {
            Some(event) => events.iter().any(|e| e.eq_ignore_ascii_case(event)),
            None => false,
        }
    }
}

impl TryFrom<&JobSpec> for JobConfig {
    type Error = crate::errors::CiJobsError;

    fn try_from(spec: &JobSpec) -> std::result::Result<Self, Self::Error> {
        match spec {
            JobSpec::Lint(LintJobSpec {
                changes,
                command,
                optional,
                events,
            }) => Ok(JobConfig::Lint(CommonJobConfig::compile(
                changes, command, *optional, events,
            )?)),
            JobSpec::Test(test) => Ok(JobConfig::Test(compile_test(test)?)),
        }
    }
}

fn compile_test(spec: &TestJobSpec) -> Result<TestJobConfig> {
    Ok(TestJobConfig {
        common: CommonJobConfig::compile(&spec.changes, &spec.command, spec.optional, &spec.events)?,
        name: spec.name.clone(),
        test_type: spec.test_type.clone(),
        report: spec.report.clone(),
        sharding_arguments: spec.sharding_arguments.clone(),
        test_env: spec.test_env.clone(),
        only_for_dependencies: spec.only_for_dependencies.clone(),
    })
}
