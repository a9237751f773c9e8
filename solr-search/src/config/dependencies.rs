//! Dependency initialization and wiring for the command line.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::AppError;
use solr_search_repository::solr::{DEFAULT_BASE_URL, DEFAULT_CORE};
use solr_search_repository::{
    Index, SearchBackend, SearchService, Server, SolrBackend, SolrConnectionConfig,
};

/// Default server ID.
const DEFAULT_SERVER_ID: &str = "solr_search_server";

/// Default path of the index definition.
const DEFAULT_INDEX_CONFIG_PATH: &str = "index.json";

/// Default `commitWithin` in milliseconds.
const DEFAULT_COMMIT_WITHIN_MS: u64 = 1000;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for Solr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if the core doesn't answer the ping.
    FailFast,
    /// Retry until the core answers.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode. Valid values: "fail-fast" or "retry"
    /// (case-insensitive). Defaults to "fail-fast" if not set or invalid.
    fn parse(value: Option<String>) -> Self {
        match value.map(|v| v.to_lowercase()).as_deref() {
            None | Some("fail-fast") | Some("failfast") | Some("fail_fast") => Self::FailFast,
            Some("retry") => Self::Retry,
            Some(other) => {
                warn!(value = %other, "Invalid SOLR_CONNECTION_MODE, defaulting to 'fail-fast'");
                Self::FailFast
            }
        }
    }
}

/// Settings read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub connection: SolrConnectionConfig,
    pub server_id: String,
    pub index_config_path: PathBuf,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SOLR_URL`: Solr base URL (default: http://localhost:8983/solr)
    /// - `SOLR_CORE`: Core name (default: d8)
    /// - `SOLR_HTTP_USER` / `SOLR_HTTP_PASS`: Basic auth credentials
    /// - `SOLR_TIMEOUT_SECS`: HTTP timeout (default: 5)
    /// - `SOLR_COMMIT_WITHIN_MS`: `commitWithin` for updates, 0 disables it (default: 1000)
    /// - `SOLR_SITE_HASH`: Site hash (default: derived from the core URL)
    /// - `SERVER_ID`: ID of the configured server (default: solr_search_server)
    /// - `INDEX_CONFIG_PATH`: JSON file with the index definition (default: index.json)
    /// - `SOLR_CONNECTION_MODE`: "fail-fast" or "retry" (default: fail-fast)
    /// - `SOLR_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through a lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse_u64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let base_url = lookup("SOLR_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let core = lookup("SOLR_CORE").unwrap_or_else(|| DEFAULT_CORE.to_string());
        let commit_within = match parse_u64("SOLR_COMMIT_WITHIN_MS") {
            Some(0) => None,
            Some(ms) => Some(ms),
            None => Some(DEFAULT_COMMIT_WITHIN_MS),
        };

        let mut connection =
            SolrConnectionConfig::new(base_url, core).with_commit_within(commit_within);
        if let Some(timeout) = parse_u64("SOLR_TIMEOUT_SECS") {
            connection.timeout_secs = timeout;
        }
        if let Some(user) = lookup("SOLR_HTTP_USER") {
            connection = connection.with_credentials(user, lookup("SOLR_HTTP_PASS").unwrap_or_default());
        }
        if let Some(site_hash) = lookup("SOLR_SITE_HASH").filter(|h| !h.is_empty()) {
            connection = connection.with_site_hash(site_hash);
        }

        Self {
            connection,
            server_id: lookup("SERVER_ID").unwrap_or_else(|| DEFAULT_SERVER_ID.to_string()),
            index_config_path: lookup("INDEX_CONFIG_PATH")
                .unwrap_or_else(|| DEFAULT_INDEX_CONFIG_PATH.to_string())
                .into(),
            connection_mode: ConnectionMode::parse(lookup("SOLR_CONNECTION_MODE")),
            retry_interval: Duration::from_secs(
                parse_u64("SOLR_RETRY_INTERVAL_SECS").unwrap_or(DEFAULT_RETRY_INTERVAL_SECS),
            ),
        }
    }
}

/// Load an index definition from a JSON file.
pub fn load_index(path: &Path) -> Result<Index, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::config(format!("Failed to read index config {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::config(format!("Invalid index config {}: {}", path.display(), e))
    })
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub service: SearchService,
    pub server: Server,
    pub index: Index,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If the index config is invalid or Solr is unreachable (fail-fast mode)
    pub async fn new() -> Result<Self, AppError> {
        Self::from_settings(Settings::from_env()).await
    }

    pub async fn from_settings(settings: Settings) -> Result<Self, AppError> {
        info!(
            solr_url = %settings.connection.core_url(),
            server_id = %settings.server_id,
            index_config = %settings.index_config_path.display(),
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            "Initializing dependencies"
        );

        let index = load_index(&settings.index_config_path)?;
        let server = Server::new(settings.server_id.clone(), settings.connection.clone());
        if !server.owns(&index) {
            return Err(AppError::config(format!(
                "Index {} belongs to server {}, not {}",
                index.id, index.server_id, server.id
            )));
        }

        let backend = Self::connect_to_solr(
            &server,
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        info!(index_id = %index.id, "Solr connection established");

        Ok(Self {
            service: SearchService::new(Box::new(backend)),
            server,
            index,
        })
    }

    /// Connect to Solr with retry logic based on connection mode.
    async fn connect_to_solr(
        server: &Server,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<SolrBackend, AppError> {
        let backend = SolrBackend::for_server(server)?;
        loop {
            let failure = match backend.ping().await {
                Ok(true) => return Ok(backend),
                Ok(false) => "Solr ping did not report OK".to_string(),
                Err(e) => e.to_string(),
            };

            match mode {
                ConnectionMode::FailFast => {
                    return Err(AppError::config(format!(
                        "Failed to connect to Solr: {}",
                        failure
                    )));
                }
                ConnectionMode::Retry => {
                    warn!(
                        solr_url = %server.backend.core_url(),
                        error = %failure,
                        retry_interval_secs = retry_interval.as_secs(),
                        "Failed to connect to Solr, retrying..."
                    );
                    sleep(retry_interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::from_lookup(lookup(&[]));

        assert_eq!(settings.connection.core_url(), "http://localhost:8983/solr/d8");
        assert_eq!(settings.connection.commit_within_ms, Some(1000));
        assert_eq!(settings.connection.timeout_secs, 5);
        assert!(settings.connection.http_user.is_none());
        assert_eq!(settings.server_id, "solr_search_server");
        assert_eq!(settings.index_config_path, PathBuf::from("index.json"));
        assert_eq!(settings.connection_mode, ConnectionMode::FailFast);
        assert_eq!(settings.retry_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_settings_from_vars() {
        let settings = Settings::from_lookup(lookup(&[
            ("SOLR_URL", "http://solr:8983/solr"),
            ("SOLR_CORE", "sites"),
            ("SOLR_HTTP_USER", "admin"),
            ("SOLR_HTTP_PASS", "secret"),
            ("SOLR_TIMEOUT_SECS", "30"),
            ("SOLR_COMMIT_WITHIN_MS", "0"),
            ("SOLR_SITE_HASH", "abc123"),
            ("SOLR_CONNECTION_MODE", "RETRY"),
            ("SOLR_RETRY_INTERVAL_SECS", "not a number"),
        ]));

        assert_eq!(settings.connection.core_url(), "http://solr:8983/solr/sites");
        assert_eq!(settings.connection.http_user.as_deref(), Some("admin"));
        assert_eq!(settings.connection.http_pass.as_deref(), Some("secret"));
        assert_eq!(settings.connection.timeout_secs, 30);
        assert_eq!(settings.connection.commit_within_ms, None);
        assert_eq!(settings.connection.site_hash, "abc123");
        assert_eq!(settings.connection_mode, ConnectionMode::Retry);
        assert_eq!(settings.retry_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_connection_mode_parse() {
        assert_eq!(ConnectionMode::parse(None), ConnectionMode::FailFast);
        assert_eq!(ConnectionMode::parse(Some("fail_fast".into())), ConnectionMode::FailFast);
        assert_eq!(ConnectionMode::parse(Some("retry".into())), ConnectionMode::Retry);
        assert_eq!(ConnectionMode::parse(Some("bogus".into())), ConnectionMode::FailFast);
    }

    #[test]
    fn test_load_index() {
        let path = env::temp_dir().join(format!("solr-search-index-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{
                "id": "solr_search_index",
                "server_id": "solr_search_server",
                "fields": {
                    "name": {"type": "text", "boost": 5.0},
                    "keywords": {"type": "string", "multi_valued": true}
                },
                "options": {"index_directly": true}
            }"#,
        )
        .unwrap();

        let index = load_index(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(index.id, "solr_search_index");
        assert!(index.options.index_directly);
        assert_eq!(index.options.batch_size, 50);
        assert!(index.fields["keywords"].multi_valued);
        assert_eq!(index.fields["name"].boost, 5.0);

        assert!(matches!(
            load_index(Path::new("/nonexistent/index.json")),
            Err(AppError::ConfigError(_))
        ));
    }
}
