//! Command line definition and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use solr_search_repository::SearchBackendError;
use solr_search_shared::{FacetRequest, IndexItem, SearchQuery};
use tracing::{info, instrument};

use crate::config::Dependencies;
use crate::AppError;

#[derive(Parser, Debug)]
#[command(name = "solr-search")]
#[command(about = "Index items into and search an Apache Solr core", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Check that the Solr core answers its ping
    Ping,

    /// Index the items of a JSON file containing an array of items
    Index {
        /// Path of the items file
        path: PathBuf,
    },

    /// Search the configured index
    Search {
        /// Fulltext keywords; all items match when omitted
        keys: Vec<String>,

        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Number of results to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Return facet counts for these fields
        #[arg(long = "facet")]
        facets: Vec<String>,
    },

    /// Delete items by ID
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Commit pending changes
    Commit,

    /// Delete all items of the configured index
    Clear,
}

/// Build the search query of a `search` command.
pub fn search_query(
    index_id: &str,
    keys: &[String],
    limit: usize,
    offset: usize,
    facets: &[String],
) -> SearchQuery {
    let mut query = SearchQuery::new(index_id).range(offset, Some(limit));
    let keys = keys.join(" ");
    if !keys.trim().is_empty() {
        query = query.keys(keys);
    }
    for field in facets {
        query = query.facet(FacetRequest::new(field.as_str()));
    }
    query
}

/// Run a command and return its output.
///
/// Deletions leave a commit scheduled; the caller flushes it with
/// `SearchService::flush_pending_commit` once it is done.
#[instrument(skip(deps), fields(index_id = %deps.index.id))]
pub async fn run(command: &Command, deps: &Dependencies) -> Result<String, AppError> {
    let service = &deps.service;
    let index = &deps.index;

    match command {
        Command::Ping => {
            if !service.is_available().await {
                return Err(SearchBackendError::connection(format!(
                    "Solr core {} is not available",
                    deps.server.backend.core_url()
                ))
                .into());
            }
            Ok(format!(
                "Solr core {} is available",
                deps.server.backend.core_url()
            ))
        }
        Command::Index { path } => {
            let content = tokio::fs::read_to_string(path).await?;
            let items: Vec<IndexItem> = serde_json::from_str(&content).map_err(|e| {
                AppError::parse(format!("Invalid items file {}: {}", path.display(), e))
            })?;

            let summary = service.index_items(index, items).await?;
            let failed: Vec<_> = summary
                .results
                .iter()
                .filter(|r| !r.success)
                .map(|r| {
                    json!({
                        "id": r.item_id,
                        "error": r.error.as_ref().map(|e| e.to_string()),
                    })
                })
                .collect();

            info!(succeeded = summary.succeeded, failed = summary.failed, "Indexing finished");
            Ok(json!({
                "total": summary.total,
                "succeeded": summary.succeeded,
                "failed": failed,
            })
            .to_string())
        }
        Command::Search {
            keys,
            limit,
            offset,
            facets,
        } => {
            let query = search_query(&index.id, keys, *limit, *offset, facets);
            let results = service.search(index, &query).await?;
            serde_json::to_string_pretty(&results).map_err(|e| AppError::parse(e.to_string()))
        }
        Command::Delete { ids } => {
            service.delete_items(index, ids).await?;
            Ok(format!("Deleted {} item(s) from index {}", ids.len(), index.id))
        }
        Command::Commit => {
            service.commit().await?;
            Ok("Committed pending changes".to_string())
        }
        Command::Clear => {
            service.clear(index).await?;
            Ok(format!("Cleared index {}", index.id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["solr-search", "search", "foo", "bar", "--limit", "5"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Search {
                keys: vec!["foo".into(), "bar".into()],
                limit: 5,
                offset: 0,
                facets: vec![],
            }
        );

        let cli = Cli::try_parse_from(["solr-search", "delete", "1", "2"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Delete {
                ids: vec!["1".into(), "2".into()]
            }
        );

        assert!(Cli::try_parse_from(["solr-search", "delete"]).is_err());
        assert!(Cli::try_parse_from(["solr-search", "index"]).is_err());
    }

    #[test]
    fn test_search_query() {
        let query = search_query("idx", &[], 10, 0, &[]);
        assert!(query.keys.is_none());
        assert_eq!(query.limit, Some(10));

        let query = search_query(
            "idx",
            &["foo".to_string(), "test".to_string()],
            5,
            20,
            &["keywords".to_string()],
        );
        assert_eq!(query.keys.as_deref(), Some("foo test"));
        assert_eq!(query.offset, 20);
        assert_eq!(query.facets[0].field, "keywords");
    }
}
