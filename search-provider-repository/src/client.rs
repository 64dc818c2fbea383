//! Search provider facade.
//!
//! This module provides the main client for interacting with a search engine.
//! Application code uses this to query, index, commit and delete documents
//! without caring whether the engine is embedded or remote.

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::{ConnectionMode, SearchProviderConfig};
use crate::embedded::EmbeddedBackend;
use crate::errors::SearchError;
use crate::escape::escape_query;
use crate::interfaces::{BackendKind, SearchBackend};
use crate::solr::SolrBackend;
use search_provider_shared::{Document, QueryRequest, ResultSet};

/// Field read by [`SearchProvider::get_doc_text`].
const DOC_TEXT_FIELD: &str = "text";

/// The main client for interacting with the search engine.
///
/// Holds exactly one backend for its whole lifetime. Every call is a
/// pass-through to that backend after request validation and query
/// escaping; nothing is cached and no call is retried.
pub struct SearchProvider {
    backend: Box<dyn SearchBackend>,
}

impl SearchProvider {
    /// Connect according to `config`.
    ///
    /// Embedded mode opens (or creates) the core on disk. Remote mode builds
    /// an HTTP client and pings the core; an unreachable server fails here.
    #[instrument(skip(config))]
    pub async fn connect(config: &SearchProviderConfig) -> Result<Self, SearchError> {
        let backend: Box<dyn SearchBackend> = match config.connection_mode()? {
            ConnectionMode::Embedded { core_path } => {
                info!(core_path = %core_path.display(), "Running search provider in embedded mode");
                Box::new(EmbeddedBackend::open(&core_path)?)
            }
            ConnectionMode::Remote { url, pool } => {
                info!(url = %url, "Running search provider in remote mode");
                Box::new(SolrBackend::connect(url, &pool).await?)
            }
        };

        Ok(Self { backend })
    }

    /// Wrap an already constructed backend.
    pub fn with_backend(backend: Box<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// The kind of engine behind this provider.
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// The underlying backend.
    pub fn backend(&self) -> &dyn SearchBackend {
        self.backend.as_ref()
    }

    /// Run a query returning every stored field plus the relevance score.
    pub async fn run_query(&self, text: &str, max_results: usize) -> Result<ResultSet, SearchError> {
        self.search(&QueryRequest::new(text, max_results)).await
    }

    /// Run a query returning only the given fields.
    pub async fn run_query_with_fields(
        &self,
        text: &str,
        max_results: usize,
        fields: &[&str],
    ) -> Result<ResultSet, SearchError> {
        let request = QueryRequest::new(text, max_results).with_fields(fields.iter().copied());
        self.search(&request).await
    }

    /// Validate and escape a query request, then execute it.
    #[instrument(skip(self, request), fields(rows = request.max_results))]
    pub async fn search(&self, request: &QueryRequest) -> Result<ResultSet, SearchError> {
        if request.max_results == 0 {
            return Err(SearchError::invalid_query("max_results must be positive"));
        }

        let escaped = escape_query(&request.text);
        if escaped.trim().is_empty() {
            return Err(SearchError::invalid_query("query text is empty"));
        }

        let request = QueryRequest {
            text: escaped,
            ..request.clone()
        };
        debug!(query = %request.text, "Submitting query");

        self.backend.query(&request).await
    }

    /// First value of `field` on the document with identifier `id`.
    ///
    /// Returns `Ok(None)` when no document has that identifier or the
    /// document lacks the field.
    pub async fn get_field_value(
        &self,
        id: &str,
        field: &str,
    ) -> Result<Option<Value>, SearchError> {
        if id.is_empty() {
            return Err(SearchError::invalid_query("document id is required"));
        }
        if field.is_empty() {
            return Err(SearchError::invalid_query("field name is required"));
        }

        let document = self.backend.find_by_id(id, &[field.to_string()]).await?;
        Ok(document.and_then(|d| d.first_value(field).cloned()))
    }

    /// The `text` field of a document, or an empty string when absent.
    pub async fn get_doc_text(&self, id: &str) -> Result<String, SearchError> {
        let text = match self.get_field_value(id, DOC_TEXT_FIELD).await? {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Ok(text)
    }

    /// Submit a document for indexing. Not visible until [`commit`](Self::commit).
    pub async fn index_document(&self, document: &Document) -> Result<(), SearchError> {
        self.index_documents(std::slice::from_ref(document)).await
    }

    /// Submit several documents in one request. Not visible until commit.
    pub async fn index_documents(&self, documents: &[Document]) -> Result<(), SearchError> {
        if documents.is_empty() {
            return Ok(());
        }

        for document in documents {
            if document.id().is_none() {
                return Err(SearchError::index("All documents must have an id"));
            }
        }

        self.backend.add_documents(documents).await
    }

    /// Make pending adds and deletes visible to queries.
    pub async fn commit(&self) -> Result<(), SearchError> {
        self.backend.commit().await
    }

    /// Delete every document matching `query`, escaped like query text.
    pub async fn delete_by_query(&self, query: &str) -> Result<(), SearchError> {
        let escaped = escape_query(query);
        if escaped.trim().is_empty() {
            return Err(SearchError::invalid_query("delete query is empty"));
        }

        self.backend.delete_by_query(&escaped).await
    }

    /// Check that the engine is reachable.
    pub async fn ping(&self) -> Result<(), SearchError> {
        self.backend.ping().await
    }

    /// Release the engine if this provider owns it.
    ///
    /// Consumes the provider, so an embedded core is released exactly once.
    pub async fn shutdown(self) -> Result<(), SearchError> {
        let kind = self.backend.kind();
        if kind.owns_engine() {
            self.backend.shutdown().await?;
        }
        debug!(kind = %kind, "Search provider shut down");
        Ok(())
    }
}
