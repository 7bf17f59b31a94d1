// src/test_env/wordpress.rs

//! WordPress version resolution against the WordPress.org version-check API.

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::errors::{CiJobsError, Result};
use crate::test_env::{
    TestEnvConfig, TestEnvResolver, TestEnvVars, WP_ENV_CORE, WP_ENV_PHP_VERSION, WP_VERSION,
};

/// Version-check endpoint. Offers are listed newest first.
pub const VERSION_CHECK_URL: &str = "https://api.wordpress.org/core/version-check/1.7/";

const CORE_REPO: &str = "WordPress/WordPress";

/// One entry of the version-check `offers` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionOffer {
    #[serde(default)]
    pub response: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct VersionCheckResponse {
    #[serde(default)]
    offers: Vec<VersionOffer>,
}

/// Release channel of the version-check API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stable,
    Beta,
}

/// Which kind of pre-release a job asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrereleaseKind {
    Any,
    ReleaseCandidate,
    Beta,
}

impl PrereleaseKind {
    fn accepts(self, version: &str) -> bool {
        if !version.contains('-') {
            return false;
        }
        let lower = version.to_lowercase();
        match self {
            PrereleaseKind::Any => true,
            PrereleaseKind::ReleaseCandidate => lower.contains("rc"),
            PrereleaseKind::Beta => lower.contains("beta"),
        }
    }
}

/// A parsed `wp_version` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WpVersionRequest {
    /// `nightly` / `trunk`.
    Trunk,
    /// `latest` (offset 0) or `latest-N`.
    Latest { offset: usize },
    /// `prerelease` / `rc` / `beta`.
    Prerelease(PrereleaseKind),
    /// Explicit `x.y` or `x.y.z`.
    Exact(String),
}

impl WpVersionRequest {
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim().to_lowercase();
        let request = match value.as_str() {
            "nightly" | "trunk" => WpVersionRequest::Trunk,
            "latest" => WpVersionRequest::Latest { offset: 0 },
            "prerelease" => WpVersionRequest::Prerelease(PrereleaseKind::Any),
            "rc" => WpVersionRequest::Prerelease(PrereleaseKind::ReleaseCandidate),
            "beta" => WpVersionRequest::Prerelease(PrereleaseKind::Beta),
            other => {
                if let Some(offset) = other.strip_prefix("latest-") {
                    let offset = offset.parse::<usize>().map_err(|_| {
                        CiJobsError::TestEnv(format!("invalid wp_version '{raw}'"))
                    })?;
                    WpVersionRequest::Latest { offset }
                } else if is_release_version(other) {
                    WpVersionRequest::Exact(other.to_string())
                } else {
                    return Err(CiJobsError::TestEnv(format!(
                        "invalid wp_version '{raw}' (expected latest, latest-N, nightly, trunk, prerelease, rc, beta or x.y[.z])"
                    )));
                }
            }
        };
        Ok(request)
    }

    /// Channel whose offers are needed to resolve this request, if any.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            WpVersionRequest::Latest { .. } => Some(Channel::Stable),
            WpVersionRequest::Prerelease(_) => Some(Channel::Beta),
            WpVersionRequest::Trunk | WpVersionRequest::Exact(_) => None,
        }
    }

    /// Pick a concrete version from `offers` (ignored for trunk/exact).
    pub fn resolve(&self, offers: &[VersionOffer]) -> Option<String> {
        match self {
            WpVersionRequest::Trunk => None,
            WpVersionRequest::Exact(v) => Some(v.clone()),
            WpVersionRequest::Latest { offset } => {
                let mut majors: Vec<&str> = Vec::new();
                for offer in offers.iter().filter(|o| !o.version.contains('-')) {
                    let major = major_version(&offer.version);
                    if majors.contains(&major) {
                        continue;
                    }
                    if majors.len() == *offset {
                        return Some(offer.version.clone());
                    }
                    majors.push(major);
                }
                None
            }
            WpVersionRequest::Prerelease(kind) => offers
                .iter()
                .find(|o| kind.accepts(&o.version))
                .map(|o| o.version.clone()),
        }
    }

    fn core_source(&self, version: Option<&str>) -> Option<String> {
        match (self, version) {
            (WpVersionRequest::Trunk, _) => Some(format!("{CORE_REPO}#master")),
            (WpVersionRequest::Prerelease(_), Some(v)) => {
                Some(format!("https://wordpress.org/wordpress-{v}.zip"))
            }
            (_, Some(v)) => Some(format!("{CORE_REPO}#{v}")),
            (_, None) => None,
        }
    }
}

/// `6.5.2` -> `6.5`.
fn major_version(version: &str) -> &str {
    match version.match_indices('.').nth(1) {
        Some((idx, _)) => &version[..idx],
        None => version,
    }
}

fn is_release_version(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

/// Build the environment variables for `config` given the offers of the
/// channel its `wp_version` needs.
pub fn build_env_vars(config: &TestEnvConfig, offers: &[VersionOffer]) -> Result<TestEnvVars> {
    let mut vars = TestEnvVars::new();

    if let Some(raw) = config.wp_version.as_deref() {
        let request = WpVersionRequest::parse(raw)?;
        let version = request.resolve(offers);
        if let Some(core) = request.core_source(version.as_deref()) {
            vars.insert(WP_ENV_CORE.to_string(), core);
        }
        if let Some(version) = version {
            vars.insert(WP_VERSION.to_string(), version);
        }
    }

    if let Some(php) = config.php_version.as_deref() {
        vars.insert(WP_ENV_PHP_VERSION.to_string(), php.to_string());
    }

    Ok(vars)
}

/// Resolver backed by the WordPress.org API.
///
/// Offers are fetched at most once per channel and reused for every job of
/// the invocation.
#[derive(Debug)]
pub struct WordPressEnvResolver {
    client: reqwest::Client,
    base_url: String,
    stable: OnceCell<Vec<VersionOffer>>,
    beta: OnceCell<Vec<VersionOffer>>,
}

impl WordPressEnvResolver {
    pub fn new() -> Result<Self> {
        Self::with_base_url(VERSION_CHECK_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cijobs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CiJobsError::TestEnv(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            stable: OnceCell::new(),
            beta: OnceCell::new(),
        }
    }

    async fn offers(&self, channel: Channel) -> Result<&[VersionOffer]> {
        let cell = match channel {
            Channel::Stable => &self.stable,
            Channel::Beta => &self.beta,
        };
        let offers = cell.get_or_try_init(|| self.fetch(channel)).await?;
        Ok(offers.as_slice())
    }

    async fn fetch(&self, channel: Channel) -> Result<Vec<VersionOffer>> {
        let mut request = self.client.get(&self.base_url);
        if channel == Channel::Beta {
            request = request.query(&[("channel", "beta")]);
        }

        debug!(url = %self.base_url, ?channel, "fetching WordPress version offers");

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CiJobsError::TestEnv(format!("fetching {}: {e}", self.base_url)))?;
        let body: VersionCheckResponse = response
            .json()
            .await
            .map_err(|e| CiJobsError::TestEnv(format!("decoding version offers: {e}")))?;

        Ok(body.offers)
    }
}

impl TestEnvResolver for WordPressEnvResolver {
    fn resolve<'a>(
        &'a self,
        config: &'a TestEnvConfig,
    ) -> Pin<Box<dyn Future<Output = Result<TestEnvVars>> + Send + 'a>> {
        Box::pin(async move {
            let channel = match config.wp_version.as_deref() {
                Some(raw) => WpVersionRequest::parse(raw)?.channel(),
                None => None,
            };
            let offers: &[VersionOffer] = match channel {
                Some(channel) => self.offers(channel).await?,
                None => &[],
            };
            build_env_vars(config, offers)
        })
    }
}
