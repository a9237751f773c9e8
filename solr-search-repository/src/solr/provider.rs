//! Apache Solr backend implementation.
//!
//! Talks to a single Solr core over its JSON HTTP API: documents are posted
//! to the `update` handler, searches go to `select` and health checks to
//! `admin/ping`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};
use solr_search_shared::{IndexItem, MultiIndexQuery, MultiResultSet, ResultSet, SearchQuery};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::SearchBackendError;
use crate::interfaces::{HookRegistry, SearchBackend};
use crate::solr::connection_config::SolrConnectionConfig;
use crate::solr::data_types::DataTypeRegistry;
use crate::solr::document_builder::build_documents;
use crate::solr::escape::phrase;
use crate::solr::field_mapping::{FieldMapper, IndexFieldNames};
use crate::solr::query_builder::{build_multi_search_request, build_search_request};
use crate::solr::request::{RequestMethod, SolrRequest};
use crate::solr::result_parser::{parse_multi_response, parse_search_response};
use crate::types::{Index, Server};
use crate::utils::solr_document_id;

/// Solr backend for the indexes of one server.
///
/// Deletions schedule a commit instead of committing right away; see
/// [`SearchBackend::flush_pending_commit`].
///
/// # Example
///
/// ```no_run
/// use solr_search_repository::solr::{SolrBackend, SolrConnectionConfig};
/// use solr_search_repository::SearchBackend;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = SolrBackend::new(SolrConnectionConfig::new("http://localhost:8983/solr", "d8"))?;
/// if backend.ping().await? {
///     backend.commit().await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct SolrBackend {
    client: Client,
    config: SolrConnectionConfig,
    site_hash: String,
    mapper: FieldMapper,
    hooks: Arc<HookRegistry>,
    commit_scheduled: AtomicBool,
}

impl SolrBackend {
    /// Create a backend with the default data types and no alter hooks.
    ///
    /// # Arguments
    ///
    /// * `config` - Connection settings of the Solr core
    ///
    /// # Returns
    ///
    /// * `Ok(SolrBackend)` - A new backend; no request is sent yet
    /// * `Err(SearchBackendError)` - If the URL is invalid or the HTTP client can't be built
    pub fn new(config: SolrConnectionConfig) -> Result<Self, SearchBackendError> {
        Self::with_extensions(config, DataTypeRegistry::new(), HookRegistry::new())
    }

    /// Create a backend with custom data types and alter hooks.
    pub fn with_extensions(
        config: SolrConnectionConfig,
        registry: DataTypeRegistry,
        hooks: HookRegistry,
    ) -> Result<Self, SearchBackendError> {
        config.endpoint("select")?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SearchBackendError::connection(e.to_string()))?;

        let site_hash = config.effective_site_hash();
        let hooks = Arc::new(hooks);
        let mapper = FieldMapper::new(Arc::new(registry), Arc::clone(&hooks));

        info!(
            url = %config.core_url(),
            site_hash = %site_hash,
            hooks = hooks.len(),
            "Created Solr backend"
        );

        Ok(Self {
            client,
            config,
            site_hash,
            mapper,
            hooks,
            commit_scheduled: AtomicBool::new(false),
        })
    }

    /// Create a backend for a configured server.
    pub fn for_server(server: &Server) -> Result<Self, SearchBackendError> {
        Self::new(server.backend.clone())
    }

    pub fn config(&self) -> &SolrConnectionConfig {
        &self.config
    }

    /// Hash separating this site's documents from others in the same core.
    pub fn site_hash(&self) -> &str {
        &self.site_hash
    }

    pub fn field_mapper(&self) -> &FieldMapper {
        &self.mapper
    }

    /// Field mappings of an index, as used for indexing and searching.
    pub fn field_names(&self, index: &Index) -> Arc<IndexFieldNames> {
        self.mapper.field_names(index)
    }

    fn request(&self, method: Method, handler: &str) -> Result<RequestBuilder, SearchBackendError> {
        let url = self.config.endpoint(handler)?;
        let mut builder = self.client.request(method, url);
        if let Some(user) = &self.config.http_user {
            builder = builder.basic_auth(user, self.config.http_pass.as_ref());
        }
        Ok(builder)
    }

    /// Send a request and decode the JSON body. Non-2xx statuses become
    /// `on_error`; unreachable servers become connection errors.
    async fn send(
        &self,
        builder: RequestBuilder,
        on_error: fn(String) -> SearchBackendError,
    ) -> Result<Value, SearchBackendError> {
        let response = builder.send().await.map_err(|e| transport_error(e, on_error))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Solr request failed");
            return Err(on_error(format!(
                "Solr returned status {}: {}",
                status, error_body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchBackendError::parse(e.to_string()))
    }

    async fn update(
        &self,
        body: &Value,
        params: &[(&str, String)],
        on_error: fn(String) -> SearchBackendError,
    ) -> Result<Value, SearchBackendError> {
        let builder = self
            .request(Method::POST, "update")?
            .query(&[("wt", "json")])
            .query(params)
            .json(body);
        self.send(builder, on_error).await
    }

    async fn select(&self, request: &SolrRequest) -> Result<Value, SearchBackendError> {
        let pairs = request.to_pairs();
        let builder = match request.method {
            RequestMethod::Get => self.request(Method::GET, "select")?.query(&pairs),
            RequestMethod::Post => self.request(Method::POST, "select")?.form(&pairs),
        };
        self.send(builder, SearchBackendError::search).await
    }

    fn schedule_commit(&self) {
        self.commit_scheduled.store(true, Ordering::SeqCst);
    }

    /// Parameters controlling when indexed documents become visible.
    fn commit_params(&self, index: &Index) -> Vec<(&'static str, String)> {
        if index.options.index_directly {
            vec![("commit", "true".to_string())]
        } else if let Some(ms) = self.config.commit_within_ms {
            vec![("commitWithin", ms.to_string())]
        } else {
            Vec::new()
        }
    }
}

fn transport_error(e: reqwest::Error, on_error: fn(String) -> SearchBackendError) -> SearchBackendError {
    if e.is_connect() || e.is_timeout() {
        SearchBackendError::connection(e.to_string())
    } else {
        on_error(e.to_string())
    }
}

#[async_trait]
impl SearchBackend for SolrBackend {
    /// Ping the core's `admin/ping` handler.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Solr reported status `OK`
    /// * `Ok(false)` - Solr answered with an error status or a non-OK status
    /// * `Err(SearchBackendError)` - If Solr couldn't be reached
    #[instrument(skip(self), fields(url = %self.config.core_url()))]
    async fn ping(&self) -> Result<bool, SearchBackendError> {
        let response = self
            .request(Method::GET, "admin/ping")?
            .query(&[("wt", "json")])
            .send()
            .await
            .map_err(|e| SearchBackendError::connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Solr ping returned an error status");
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchBackendError::parse(e.to_string()))?;
        let ok = body.get("status").and_then(Value::as_str) == Some("OK");
        debug!(ok, "Pinged Solr");
        Ok(ok)
    }

    #[instrument(skip(self))]
    async fn commit(&self) -> Result<(), SearchBackendError> {
        // Clear before sending: deletions made while the request is in flight
        // schedule a new commit.
        let was_scheduled = self.commit_scheduled.swap(false, Ordering::SeqCst);
        if let Err(e) = self
            .update(&json!({"commit": {}}), &[], SearchBackendError::commit)
            .await
        {
            if was_scheduled {
                self.schedule_commit();
            }
            return Err(e);
        }
        debug!("Committed pending changes");
        Ok(())
    }

    /// Index items, replacing the documents of items indexed before.
    ///
    /// Documents go through the `alter_documents` hooks first; the returned
    /// IDs are those of the documents actually sent.
    #[instrument(skip(self, index, items), fields(index_id = %index.id, count = items.len()))]
    async fn index_items(
        &self,
        index: &Index,
        items: &[IndexItem],
    ) -> Result<Vec<String>, SearchBackendError> {
        index.ensure_writable()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let names = self.mapper.field_names(index);
        let mut documents =
            build_documents(index, items, &names, self.mapper.registry(), &self.site_hash);
        self.hooks.alter_documents(&mut documents, index, items);
        if documents.is_empty() {
            debug!("All documents removed by alter hooks");
            return Ok(Vec::new());
        }

        let indexed: Vec<String> = documents
            .iter()
            .filter_map(|doc| doc.item_id().map(str::to_string))
            .collect();
        let body = serde_json::to_value(&documents)
            .map_err(|e| SearchBackendError::serialization(e.to_string()))?;

        self.update(&body, &self.commit_params(index), SearchBackendError::index)
            .await?;

        debug!(indexed = indexed.len(), "Indexed items");
        Ok(indexed)
    }

    #[instrument(skip(self, index, item_ids), fields(index_id = %index.id, count = item_ids.len()))]
    async fn delete_items(
        &self,
        index: &Index,
        item_ids: &[String],
    ) -> Result<(), SearchBackendError> {
        index.ensure_writable()?;
        if item_ids.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = item_ids
            .iter()
            .map(|id| solr_document_id(&self.site_hash, &index.id, id))
            .collect();
        self.update(&json!({ "delete": ids }), &[], SearchBackendError::delete)
            .await?;
        self.schedule_commit();

        debug!("Deleted items");
        Ok(())
    }

    /// Delete every document of the index written by this site.
    #[instrument(skip(self, index), fields(index_id = %index.id))]
    async fn delete_all_items(&self, index: &Index) -> Result<(), SearchBackendError> {
        index.ensure_writable()?;

        let query = format!(
            "index_id:{} AND hash:{}",
            phrase(&index.id),
            phrase(&self.site_hash)
        );
        self.update(
            &json!({ "delete": { "query": query } }),
            &[],
            SearchBackendError::delete,
        )
        .await?;
        self.schedule_commit();

        info!("Deleted all items of index");
        Ok(())
    }

    #[instrument(skip(self, index, query), fields(index_id = %index.id))]
    async fn search(
        &self,
        index: &Index,
        query: &SearchQuery,
    ) -> Result<ResultSet, SearchBackendError> {
        let names = self.mapper.field_names(index);
        let mut request =
            build_search_request(index, &names, self.mapper.registry(), &self.site_hash, query)?;
        let method = request.method;
        self.hooks.alter_query(&mut request, query);
        request.refresh_method(method);

        let body = self.select(&request).await?;
        let mut results = parse_search_response(&body, index, &names)?;
        self.hooks.alter_results(&mut results, query, &body);

        debug!(
            result_count = results.result_count,
            returned = results.len(),
            "Search finished"
        );
        Ok(results)
    }

    #[instrument(skip(self, indexes, query), fields(indexes = indexes.len()))]
    async fn search_multi(
        &self,
        indexes: &[Index],
        query: &MultiIndexQuery,
    ) -> Result<MultiResultSet, SearchBackendError> {
        if indexes.is_empty() {
            return Err(SearchBackendError::validation(
                "At least one index must be searched",
            ));
        }

        let names: Vec<Arc<IndexFieldNames>> = indexes
            .iter()
            .map(|index| self.mapper.field_names(index))
            .collect();
        let targets: Vec<(&Index, &IndexFieldNames)> = indexes
            .iter()
            .zip(names.iter())
            .map(|(index, names)| (index, names.as_ref()))
            .collect();

        let mut request =
            build_multi_search_request(&targets, self.mapper.registry(), &self.site_hash, query)?;
        let method = request.method;
        self.hooks.alter_multi_query(&mut request, query);
        request.refresh_method(method);

        let body = self.select(&request).await?;
        let mut results = parse_multi_response(&body, &targets)?;
        self.hooks.alter_multi_results(&mut results, query, &body);

        debug!(
            result_count = results.result_count,
            returned = results.len(),
            "Multi-index search finished"
        );
        Ok(results)
    }

    fn has_pending_commit(&self) -> bool {
        self.commit_scheduled.load(Ordering::SeqCst)
    }
}
