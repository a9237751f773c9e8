//! Solr connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::SearchBackendError;
use crate::utils::derive_site_hash;

/// Default Solr base URL (without core).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8983/solr";

/// Default core name.
pub const DEFAULT_CORE: &str = "d8";

/// Connection settings for one Solr core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolrConnectionConfig {
    /// Base URL of the Solr webapp, e.g. `http://localhost:8983/solr`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_core")]
    pub core: String,

    /// Basic auth credentials.
    #[serde(default)]
    pub http_user: Option<String>,
    #[serde(default)]
    pub http_pass: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `commitWithin` sent with update requests, unless the index commits directly.
    #[serde(default)]
    pub commit_within_ms: Option<u64>,

    /// Hash written to every document to separate sites sharing the core.
    #[serde(default)]
    pub site_hash: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_core() -> String {
    DEFAULT_CORE.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for SolrConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_CORE)
    }
}

impl SolrConnectionConfig {
    /// Create a configuration for a core, deriving the site hash from its URL.
    pub fn new(base_url: impl Into<String>, core: impl Into<String>) -> Self {
        let mut config = Self {
            base_url: base_url.into(),
            core: core.into(),
            http_user: None,
            http_pass: None,
            timeout_secs: default_timeout_secs(),
            commit_within_ms: Some(1000),
            site_hash: String::new(),
        };
        config.site_hash = derive_site_hash(&config.core_url());
        config
    }

    pub fn with_site_hash(mut self, site_hash: impl Into<String>) -> Self {
        self.site_hash = site_hash.into();
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.http_user = Some(user.into());
        self.http_pass = Some(pass.into());
        self
    }

    pub fn with_commit_within(mut self, commit_within_ms: Option<u64>) -> Self {
        self.commit_within_ms = commit_within_ms;
        self
    }

    /// The core's URL as a display string.
    pub fn core_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.core.trim_matches('/')
        )
    }

    /// URL of a request handler of the core, e.g. `select` or `admin/ping`.
    pub fn endpoint(&self, handler: &str) -> Result<Url, SearchBackendError> {
        let base = format!("{}/", self.core_url());
        let base = Url::parse(&base).map_err(|e| {
            SearchBackendError::connection(format!("Invalid Solr URL '{}': {}", base, e))
        })?;
        base.join(handler.trim_start_matches('/')).map_err(|e| {
            SearchBackendError::connection(format!("Invalid Solr handler '{}': {}", handler, e))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn commit_within(&self) -> Option<Duration> {
        self.commit_within_ms.map(Duration::from_millis)
    }

    /// Site hash in effect, derived from the core URL when none is configured.
    pub fn effective_site_hash(&self) -> String {
        if self.site_hash.is_empty() {
            derive_site_hash(&self.core_url())
        } else {
            self.site_hash.clone()
        }
    }
}
