// src/jobs/mod.rs

//! Job definitions and job derivation.
//!
//! - [`rules`] compiles `changes` trigger patterns.
//! - [`model`] holds the compiled job definitions attached to projects.
//! - [`command`] substitutes `<var>` tokens in job commands.
//! - [`job`] defines the lint/test jobs handed to the CI orchestrator.
//! - [`deriver`] walks the project graph and decides which jobs run.

pub mod command;
pub mod deriver;
pub mod job;
pub mod model;
pub mod rules;

pub use command::{substitute, CommandVars, BASE_REF_VAR, EVENT_VAR};
pub use deriver::{create_jobs, CreateOptions, JobKey};
pub use job::{expand_shards, Jobs, LintJob, ResolvedTestEnv, TestJob};
pub use model::{CommonJobConfig, JobConfig, ReportConfig, TestJobConfig};
pub use rules::ChangeRules;
