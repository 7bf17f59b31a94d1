// src/jobs/job.rs

//! Concrete jobs handed to the CI orchestrator.

use serde::Serialize;

use crate::jobs::model::ReportConfig;
use crate::test_env::TestEnvVars;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintJob {
    pub project_name: String,
    pub project_path: String,
    pub command: String,
    pub optional: bool,
}

/// Environment a test job needs before it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTestEnv {
    pub should_create: bool,
    pub env_vars: TestEnvVars,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestJob {
    pub project_name: String,
    pub project_path: String,
    pub name: String,
    pub command: String,
    pub test_env: ResolvedTestEnv,
    /// 0 for unsharded jobs, otherwise the 1-based shard index.
    pub shard_number: usize,
    pub test_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,
    pub optional: bool,
}

/// All jobs derived for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Jobs {
    pub lint: Vec<LintJob>,
    pub test: Vec<TestJob>,
}

impl Jobs {
    pub fn is_empty(&self) -> bool {
        self.lint.is_empty() && self.test.is_empty()
    }

    pub fn extend(&mut self, other: Jobs) {
        self.lint.extend(other.lint);
        self.test.extend(other.test);
    }
}

/// Multiply `job` into one job per sharding argument.
///
/// With zero or one argument the job is returned unchanged.
pub fn expand_shards(job: TestJob, sharding_arguments: &[String]) -> Vec<TestJob> {
    if sharding_arguments.len() <= 1 {
        return vec![job];
    }

    let total = sharding_arguments.len();
    sharding_arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let shard = i + 1;
            TestJob {
                name: format!("{} {shard}/{total}", job.name),
                command: format!("{} {arg}", job.command),
                shard_number: shard,
                ..job.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> TestJob {
        TestJob {
            project_name: "core".into(),
            project_path: "plugins/core".into(),
            name: "E2E".into(),
            command: "pnpm test:e2e".into(),
            test_env: ResolvedTestEnv::default(),
            shard_number: 0,
            test_type: "e2e".into(),
            report: None,
            optional: false,
        }
    }

    #[test]
    fn single_argument_does_not_shard() {
        let jobs = expand_shards(job(), &["--shard=1/1".to_string()]);
        assert_eq!(jobs, vec![job()]);
    }

    #[test]
    fn three_arguments_make_three_named_shards() {
        let args: Vec<String> = (1..=3).map(|i| format!("--shard={i}/3")).collect();
        let jobs = expand_shards(job(), &args);
        let names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, ["E2E 1/3", "E2E 2/3", "E2E 3/3"]);
        assert_eq!(jobs[1].command, "pnpm test:e2e --shard=2/3");
        assert_eq!(jobs[2].shard_number, 3);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(job()).unwrap();
        assert_eq!(json["projectName"], "core");
        assert_eq!(json["shardNumber"], 0);
        assert_eq!(json["testEnv"]["shouldCreate"], false);
        assert!(json.get("report").is_none());
    }
}
