//! Search backend trait definition.
//!
//! This module defines the abstract interface over a search engine connection,
//! implemented by the remote Solr client and the embedded tantivy engine.

use std::fmt;

use async_trait::async_trait;

use crate::errors::SearchError;
use search_provider_shared::{Document, QueryRequest, ResultSet};

/// Which kind of engine a backend talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process engine owned by the backend.
    Embedded,
    /// Networked engine reached over HTTP.
    Remote,
}

impl BackendKind {
    /// Whether the backend owns the engine lifecycle and must be shut down.
    pub fn owns_engine(&self) -> bool {
        matches!(self, Self::Embedded)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Abstract interface for search engine operations.
///
/// Backends receive query text exactly as it should reach the engine's query
/// parser; escaping and request validation happen in `SearchProvider`.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so one connection can serve
/// concurrent callers.
///
/// # Error Handling
///
/// All methods return `Result<T, SearchError>`. Failures are never swallowed.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// The kind of engine behind this backend.
    fn kind(&self) -> BackendKind;

    /// Execute a query and return matching documents in relevance order.
    ///
    /// # Arguments
    ///
    /// * `request` - Query text, row limit and field list
    ///
    /// # Returns
    ///
    /// * `Ok(ResultSet)` - The matching documents and total match count
    /// * `Err(SearchError::QueryError)` - If the engine rejects or fails the query
    async fn query(&self, request: &QueryRequest) -> Result<ResultSet, SearchError>;

    /// Look up one document by exact identifier.
    ///
    /// Only the named fields are returned.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Document))` - The document with that identifier
    /// * `Ok(None)` - If no document has that identifier
    async fn find_by_id(
        &self,
        id: &str,
        fields: &[String],
    ) -> Result<Option<Document>, SearchError>;

    /// Submit documents for indexing.
    ///
    /// Documents with an identifier that already exists replace the old
    /// version. Nothing becomes visible to queries until `commit`.
    async fn add_documents(&self, documents: &[Document]) -> Result<(), SearchError>;

    /// Make all pending adds and deletes visible to queries.
    async fn commit(&self) -> Result<(), SearchError>;

    /// Delete every document matching the query. Takes effect on `commit`.
    async fn delete_by_query(&self, query: &str) -> Result<(), SearchError>;

    /// Check that the engine is reachable and serving requests.
    async fn ping(&self) -> Result<(), SearchError>;

    /// Release the engine.
    ///
    /// Backends that do not own their engine leave this as a no-op.
    async fn shutdown(&self) -> Result<(), SearchError> {
        Ok(())
    }
}
