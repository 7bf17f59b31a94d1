// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiJobsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Cycle detected in project graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid change pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Command template '{command}' references missing variable '{var}'")]
    MissingCommandVar { var: String, command: String },

    #[error("Diff command `{command}` failed: {message}")]
    DiffFailed { command: String, message: String },

    #[error("Test environment error: {0}")]
    TestEnv(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CiJobsError>;
