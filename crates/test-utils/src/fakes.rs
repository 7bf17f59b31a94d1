use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use cijobs::changes::{DiffProvider, DiffSource};
use cijobs::errors::{CiJobsError, Result};
use cijobs::test_env::{TestEnvConfig, TestEnvResolver, TestEnvVars, WP_VERSION};

/// A diff provider that returns a fixed list of paths and records which
/// sources were asked for.
#[derive(Debug, Default, Clone)]
pub struct FakeDiffProvider {
    files: Vec<String>,
    requested: Arc<Mutex<Vec<DiffSource>>>,
}

impl FakeDiffProvider {
    pub fn new<S: Into<String>>(files: impl IntoIterator<Item = S>) -> Self {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            requested: Arc::default(),
        }
    }

    pub fn requested(&self) -> Vec<DiffSource> {
        self.requested.lock().unwrap().clone()
    }
}

impl DiffProvider for FakeDiffProvider {
    fn changed_files<'a>(
        &'a self,
        source: &'a DiffSource,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move {
            self.requested.lock().unwrap().push(source.clone());
            Ok(self.files.clone())
        })
    }
}

/// A diff provider whose command always fails.
#[derive(Debug, Default, Clone)]
pub struct FailingDiffProvider;

impl DiffProvider for FailingDiffProvider {
    fn changed_files<'a>(
        &'a self,
        source: &'a DiffSource,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>> {
        Box::pin(async move {
            Err(CiJobsError::DiffFailed {
                command: format!("git diff --name-only {source}"),
                message: "fatal: bad revision".to_string(),
            })
        })
    }
}

/// A resolver that maps `wp_version` labels to fixed versions.
///
/// Unknown labels resolve to no `WP_VERSION`, which is how an unavailable
/// pre-release looks. Every call is recorded.
#[derive(Debug, Default, Clone)]
pub struct FakeTestEnvResolver {
    versions: HashMap<String, String>,
    calls: Arc<Mutex<Vec<TestEnvConfig>>>,
}

impl FakeTestEnvResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, label: &str, version: &str) -> Self {
        self.versions.insert(label.to_string(), version.to_string());
        self
    }

    pub fn calls(&self) -> Vec<TestEnvConfig> {
        self.calls.lock().unwrap().clone()
    }
}

impl TestEnvResolver for FakeTestEnvResolver {
    fn resolve<'a>(
        &'a self,
        config: &'a TestEnvConfig,
    ) -> Pin<Box<dyn Future<Output = Result<TestEnvVars>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(config.clone());

            let mut vars = TestEnvVars::new();
            if let Some(version) = config
                .wp_version
                .as_ref()
                .and_then(|label| self.versions.get(label))
            {
                vars.insert(WP_VERSION.to_string(), version.clone());
            }
            if let Some(php) = &config.php_version {
                vars.insert("WP_ENV_PHP_VERSION".to_string(), php.clone());
            }
            Ok(vars)
        })
    }
}
