// src/test_env/mod.rs

//! Test environment resolution.
//!
//! Test jobs may ask for an environment (a WordPress core version and a PHP
//! version). The job deriver hands the requested [`TestEnvConfig`] to a
//! [`TestEnvResolver`], which turns it into environment variables for the
//! job's `start` command.
//!
//! - [`wordpress`] contains the production resolver backed by the
//!   WordPress.org version-check API.

pub mod wordpress;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub use wordpress::{VersionOffer, WordPressEnvResolver, WpVersionRequest};

/// Core source for the test environment (`owner/repo#ref` or a zip URL).
pub const WP_ENV_CORE: &str = "WP_ENV_CORE";
/// Concrete WordPress version the environment runs, when one is known.
pub const WP_VERSION: &str = "WP_VERSION";
/// PHP version of the test environment.
pub const WP_ENV_PHP_VERSION: &str = "WP_ENV_PHP_VERSION";

/// `wp_version` labels that name a pre-release channel.
///
/// Pre-release builds are not always published; a job asking for one is
/// skipped when nothing is available.
pub const PRERELEASE_CHANNELS: &[&str] = &["prerelease", "rc", "beta"];

/// Environment variables produced by a resolver.
pub type TestEnvVars = BTreeMap<String, String>;

/// `test_env` table of a test job.
///
/// ```toml
/// [project.core.job.test_env]
/// start = "env:start"
/// config = { wp_version = "latest", php_version = "8.1" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestEnvSpec {
    /// Script that creates the environment.
    pub start: String,

    #[serde(default)]
    pub config: TestEnvConfig,
}

/// The requested environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestEnvConfig {
    /// `latest`, `latest-N`, `nightly`, `trunk`, `prerelease`, `rc`, `beta`
    /// or an explicit `x.y[.z]` version.
    #[serde(default)]
    pub wp_version: Option<String>,

    #[serde(default)]
    pub php_version: Option<String>,
}

impl TestEnvConfig {
    /// Whether `wp_version` names a pre-release channel.
    pub fn requests_prerelease(&self) -> bool {
        self.wp_version
            .as_deref()
            .map(|v| PRERELEASE_CHANNELS.contains(&v.trim().to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// Trait abstracting how a test environment config becomes variables.
///
/// Production code uses [`WordPressEnvResolver`]; tests provide their own
/// implementation that doesn't touch the network.
pub trait TestEnvResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        config: &'a TestEnvConfig,
    ) -> Pin<Box<dyn Future<Output = Result<TestEnvVars>> + Send + 'a>>;
}
