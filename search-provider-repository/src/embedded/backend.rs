//! Tantivy-backed embedded engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{AllQuery, Query, QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, OwnedValue, Value as _};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};
use tracing::{debug, info, instrument, warn};

use crate::embedded::schema::{build_schema, SchemaFields};
use crate::errors::SearchError;
use crate::interfaces::{BackendKind, SearchBackend};
use search_provider_shared::{Document, QueryRequest, ResultSet, SCORE_FIELD};

/// Memory budget for the index writer.
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// In-process search engine over a tantivy index.
///
/// Adds and deletes are buffered in the writer and only become visible after
/// `commit`, which also reloads the reader. The writer is dropped by
/// `shutdown`; every write after that fails.
///
/// Commit and shutdown touch the disk and run on tokio's blocking pool.
/// Adds and deletes only buffer into the writer and stay on the caller's task.
pub struct EmbeddedBackend {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<Option<IndexWriter>>>,
    fields: SchemaFields,
    core_path: Option<PathBuf>,
}

impl EmbeddedBackend {
    /// Open the core stored at `core_path`, creating it if needed.
    pub fn open(core_path: &Path) -> Result<Self, SearchError> {
        std::fs::create_dir_all(core_path).map_err(|e| {
            SearchError::connection(format!(
                "Failed to create core directory {}: {}",
                core_path.display(),
                e
            ))
        })?;
        let dir = MmapDirectory::open(core_path).map_err(|e| {
            SearchError::connection(format!(
                "Failed to open core directory {}: {}",
                core_path.display(),
                e
            ))
        })?;

        let (schema, fields) = build_schema();
        let index = Index::open_or_create(dir, schema)
            .map_err(|e| SearchError::connection(format!("Failed to open index: {}", e)))?;

        let backend = Self::from_index(index, fields, Some(core_path.to_path_buf()))?;
        info!(
            core_path = %core_path.display(),
            num_docs = backend.reader.searcher().num_docs(),
            "Opened embedded core"
        );
        Ok(backend)
    }

    /// Create a core that lives only in memory.
    pub fn open_in_ram() -> Result<Self, SearchError> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        Self::from_index(index, fields, None)
    }

    fn from_index(
        index: Index,
        fields: SchemaFields,
        core_path: Option<PathBuf>,
    ) -> Result<Self, SearchError> {
        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| SearchError::connection(format!("Failed to create writer: {}", e)))?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| {
                SearchError::connection(format!("Failed to create reader: {}", e))
            })?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(Some(writer))),
            fields,
            core_path,
        })
    }

    /// Directory of the core, or `None` for an in-memory core.
    pub fn core_path(&self) -> Option<&Path> {
        self.core_path.as_deref()
    }

    /// Parse query text against the catch-all field.
    ///
    /// Blank text and `*:*` match every document. Qualified terms such as
    /// `title:folding` resolve to the document field of that name.
    fn parse_query(&self, text: &str) -> Result<Box<dyn Query>, SearchError> {
        let text = text.trim();
        if text.is_empty() || text == "*:*" || text == "*" {
            return Ok(Box::new(AllQuery));
        }

        let default_fields = vec![self.fields.text, self.fields.fields];
        let parser = QueryParser::for_index(&self.index, default_fields);
        parser
            .parse_query(text)
            .map_err(|e| SearchError::query(format!("Failed to parse query '{}': {}", text, e)))
    }

    /// Load the stored document behind a hit.
    fn load_document(
        &self,
        searcher: &Searcher,
        address: tantivy::DocAddress,
    ) -> Result<Document, SearchError> {
        let stored: TantivyDocument = searcher
            .doc(address)
            .map_err(|e| SearchError::query(e.to_string()))?;

        let source = stored
            .get_first(self.fields.source)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SearchError::parse("Stored document has no source"))?;

        serde_json::from_str(source).map_err(|e| SearchError::parse(e.to_string()))
    }

    /// Convert an input document into its indexed form.
    fn to_index_document(
        &self,
        document: &Document,
    ) -> Result<(String, TantivyDocument), SearchError> {
        let id = document
            .id()
            .ok_or_else(|| SearchError::index("Document is missing the id field"))?;
        let source =
            serde_json::to_string(document).map_err(|e| SearchError::serialization(e.to_string()))?;

        let mut indexed = TantivyDocument::default();
        indexed.add_text(self.fields.id, &id);
        for (_, value) in document.iter() {
            let mut terms = Vec::new();
            collect_text(value, &mut terms);
            for term in terms {
                indexed.add_text(self.fields.text, term);
            }
        }
        indexed.add_field_value(
            self.fields.fields,
            OwnedValue::from(document.clone().into_inner()),
        );
        indexed.add_text(self.fields.source, source);

        Ok((id, indexed))
    }
}

#[async_trait]
impl SearchBackend for EmbeddedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    #[instrument(skip(self, request), fields(rows = request.max_results))]
    async fn query(&self, request: &QueryRequest) -> Result<ResultSet, SearchError> {
        if request.max_results == 0 {
            return Err(SearchError::invalid_query("max_results must be positive"));
        }

        let query = self.parse_query(&request.text)?;
        let searcher = self.reader.searcher();
        let (top_docs, count) = searcher
            .search(query.as_ref(), &(TopDocs::with_limit(request.max_results), Count))
            .map_err(|e| SearchError::query(e.to_string()))?;

        let field_list = request.field_list();
        let max_score = if request.wants_score() {
            top_docs.first().map(|(score, _)| *score)
        } else {
            None
        };

        let mut documents = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let document = self.load_document(&searcher, address)?;
            documents.push(project_fields(document, &field_list, Some(score)));
        }

        debug!(num_found = count, returned = documents.len(), "Query completed");
        Ok(ResultSet {
            documents,
            num_found: count as u64,
            max_score,
        })
    }

    async fn find_by_id(
        &self,
        id: &str,
        fields: &[String],
    ) -> Result<Option<Document>, SearchError> {
        let query = TermQuery::new(
            Term::from_field_text(self.fields.id, id),
            IndexRecordOption::Basic,
        );
        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(|e| SearchError::query(e.to_string()))?;

        match top_docs.into_iter().next() {
            Some((score, address)) => {
                let document = self.load_document(&searcher, address)?;
                Ok(Some(project_fields(document, fields, Some(score))))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn add_documents(&self, documents: &[Document]) -> Result<(), SearchError> {
        let guard = self.writer.read();
        let writer = guard
            .as_ref()
            .ok_or_else(|| SearchError::index("Embedded core has been shut down"))?;

        for document in documents {
            let (id, indexed) = self.to_index_document(document)?;
            // Replace any earlier version with the same id.
            writer.delete_term(Term::from_field_text(self.fields.id, &id));
            writer
                .add_document(indexed)
                .map_err(|e| SearchError::index(e.to_string()))?;
        }

        debug!("Documents buffered");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn commit(&self) -> Result<(), SearchError> {
        let writer = Arc::clone(&self.writer);
        let reader = self.reader.clone();

        let opstamp = tokio::task::spawn_blocking(move || {
            let mut guard = writer.write();
            let writer = guard
                .as_mut()
                .ok_or_else(|| SearchError::commit("Embedded core has been shut down"))?;

            let opstamp = writer
                .commit()
                .map_err(|e| SearchError::commit(e.to_string()))?;
            reader
                .reload()
                .map_err(|e| SearchError::commit(e.to_string()))?;
            Ok::<_, SearchError>(opstamp)
        })
        .await
        .map_err(|e| SearchError::commit(format!("Commit task failed: {}", e)))??;

        debug!(opstamp = opstamp, "Commit completed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_query(&self, query: &str) -> Result<(), SearchError> {
        let parsed = self.parse_query(query).map_err(|e| match e {
            SearchError::QueryError(msg) => SearchError::delete(msg),
            other => other,
        })?;

        let guard = self.writer.read();
        let writer = guard
            .as_ref()
            .ok_or_else(|| SearchError::delete("Embedded core has been shut down"))?;
        writer
            .delete_query(parsed)
            .map_err(|e| SearchError::delete(e.to_string()))?;

        debug!("Delete by query buffered");
        Ok(())
    }

    async fn ping(&self) -> Result<(), SearchError> {
        if self.writer.read().is_none() {
            return Err(SearchError::connection("Embedded core has been shut down"));
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SearchError> {
        let writer = self
            .writer
            .write()
            .take()
            .ok_or_else(|| SearchError::shutdown("Embedded core was already shut down"))?;

        tokio::task::spawn_blocking(move || writer.wait_merging_threads())
            .await
            .map_err(|e| SearchError::shutdown(format!("Shutdown task failed: {}", e)))?
            .map_err(|e| SearchError::shutdown(e.to_string()))?;

        match &self.core_path {
            Some(path) => info!(core_path = %path.display(), "Embedded core shut down"),
            None => info!("In-memory core shut down"),
        }
        Ok(())
    }
}

impl Drop for EmbeddedBackend {
    fn drop(&mut self) {
        if self.writer.read().is_some() {
            warn!("Embedded core dropped without shutdown; uncommitted changes are lost");
        }
    }
}

/// Keep only the requested fields of a stored document.
///
/// `*` keeps every stored field; `score` appends the hit's relevance score.
/// Stored field order is preserved.
fn project_fields(document: Document, fields: &[String], score: Option<f32>) -> Document {
    let wants = |name: &str| fields.iter().any(|f| f == name);

    let mut projected = if wants("*") {
        document
    } else {
        document
            .into_inner()
            .into_iter()
            .filter(|(name, _)| wants(name))
            .collect()
    };

    if let Some(score) = score {
        if wants(SCORE_FIELD) {
            projected.insert(SCORE_FIELD, Value::from(score as f64));
        }
    }
    projected
}

/// Flatten a field value into the strings fed to the catch-all field.
fn collect_text(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Array(values) => values.iter().for_each(|v| collect_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        Value::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, text: &str) -> Document {
        Document::new().with_field("id", id).with_field("text", text)
    }

    #[tokio::test]
    async fn test_uncommitted_documents_are_invisible() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend.add_documents(&[doc("42", "hello")]).await.unwrap();

        let results = backend.query(&QueryRequest::new("hello", 10)).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(results.num_found, 0);

        backend.commit().await.unwrap();

        let results = backend.query(&QueryRequest::new("hello", 10)).await.unwrap();
        assert_eq!(results.ids(), vec!["42"]);
        assert_eq!(results.num_found, 1);
    }

    #[tokio::test]
    async fn test_default_fields_include_score() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend.add_documents(&[doc("1", "gene expression")]).await.unwrap();
        backend.commit().await.unwrap();

        let results = backend.query(&QueryRequest::new("gene", 10)).await.unwrap();
        let first = results.first().unwrap();

        let names: Vec<&str> = first.field_names().collect();
        assert_eq!(names, vec!["id", "text", "score"]);
        assert!(first.get("score").unwrap().as_f64().unwrap() > 0.0);
        assert!(results.max_score.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_explicit_fields_projection() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        let document = Document::new()
            .with_field("id", "7")
            .with_field("title", "Protein folding")
            .with_field("text", "folding of proteins");
        backend.add_documents(&[document]).await.unwrap();
        backend.commit().await.unwrap();

        let request = QueryRequest::new("folding", 10).with_fields(["title"]);
        let results = backend.query(&request).await.unwrap();
        let first = results.first().unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first.get("title"), Some(&json!("Protein folding")));
    }

    #[tokio::test]
    async fn test_results_ranked_by_score() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend
            .add_documents(&[
                doc("1", "kinase"),
                doc("2", "kinase kinase kinase inhibitor"),
                doc("3", "unrelated text"),
            ])
            .await
            .unwrap();
        backend.commit().await.unwrap();

        let results = backend.query(&QueryRequest::new("kinase", 10)).await.unwrap();

        assert_eq!(results.num_found, 2);
        let scores: Vec<f64> = results
            .iter()
            .map(|d| d.get("score").unwrap().as_f64().unwrap())
            .collect();
        assert!(scores[0] >= scores[1]);
    }

    #[tokio::test]
    async fn test_max_results_limits_page_not_count() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        let docs: Vec<Document> = (0..5).map(|i| doc(&i.to_string(), "common")).collect();
        backend.add_documents(&docs).await.unwrap();
        backend.commit().await.unwrap();

        let results = backend.query(&QueryRequest::new("common", 2)).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.num_found, 5);
    }

    #[tokio::test]
    async fn test_same_id_replaces_document() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend.add_documents(&[doc("42", "first version")]).await.unwrap();
        backend.commit().await.unwrap();
        backend.add_documents(&[doc("42", "second version")]).await.unwrap();
        backend.commit().await.unwrap();

        let results = backend.query(&QueryRequest::new("*:*", 10)).await.unwrap();
        assert_eq!(results.num_found, 1);
        assert_eq!(
            results.first().unwrap().get("text"),
            Some(&json!("second version"))
        );
    }

    #[tokio::test]
    async fn test_missing_id_is_index_error() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        let document = Document::new().with_field("text", "orphan");

        let err = backend.add_documents(&[document]).await.unwrap_err();
        assert!(matches!(err, SearchError::IndexError(_)));
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend
            .add_documents(&[doc("15342797", "BRCA1 abstract"), doc("2", "other")])
            .await
            .unwrap();
        backend.commit().await.unwrap();

        let found = backend
            .find_by_id("15342797", &["text".to_string()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("text"), Some(&json!("BRCA1 abstract")));

        let missing = backend.find_by_id("nope", &["text".to_string()]).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_field_qualified_id_query() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend
            .add_documents(&[doc("a1", "alpha"), doc("b2", "beta")])
            .await
            .unwrap();
        backend.commit().await.unwrap();

        let results = backend.query(&QueryRequest::new("id:b2", 10)).await.unwrap();
        assert_eq!(results.ids(), vec!["b2"]);
    }

    #[tokio::test]
    async fn test_delete_by_query_visible_after_commit() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend
            .add_documents(&[doc("1", "keep me"), doc("2", "remove me")])
            .await
            .unwrap();
        backend.commit().await.unwrap();

        backend.delete_by_query("remove").await.unwrap();
        let before = backend.query(&QueryRequest::new("*:*", 10)).await.unwrap();
        assert_eq!(before.num_found, 2);

        backend.commit().await.unwrap();
        let after = backend.query(&QueryRequest::new("*:*", 10)).await.unwrap();
        assert_eq!(after.ids(), vec!["1"]);
    }

    #[tokio::test]
    async fn test_unindexed_field_query_fails() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();

        // The stored source is not indexed and cannot be searched.
        let err = backend
            .query(&QueryRequest::new("_source_:value", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::QueryError(_)));

        let err = backend.delete_by_query("_source_:value").await.unwrap_err();
        assert!(matches!(err, SearchError::DeleteError(_)));
    }

    #[tokio::test]
    async fn test_field_qualified_query() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        let folding = Document::new()
            .with_field("id", "7")
            .with_field("title", "Protein folding")
            .with_field("text", "record");
        backend
            .add_documents(&[folding, doc("8", "folding record")])
            .await
            .unwrap();
        backend.commit().await.unwrap();

        let results = backend
            .query(&QueryRequest::new("title:folding", 10))
            .await
            .unwrap();
        assert_eq!(results.ids(), vec!["7"]);

        let results = backend
            .query(&QueryRequest::new("text:record", 10))
            .await
            .unwrap();
        assert_eq!(results.num_found, 2);

        let results = backend
            .query(&QueryRequest::new("nosuchfield:value", 10))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_field_qualified_delete() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend
            .add_documents(&[doc("1", "obsolete record"), doc("2", "current record")])
            .await
            .unwrap();
        backend.commit().await.unwrap();

        backend.delete_by_query("text:obsolete").await.unwrap();
        backend.commit().await.unwrap();

        let results = backend.query(&QueryRequest::new("*:*", 10)).await.unwrap();
        assert_eq!(results.ids(), vec!["2"]);
    }

    #[tokio::test]
    async fn test_max_score_only_when_score_requested() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend.add_documents(&[doc("1", "kinase")]).await.unwrap();
        backend.commit().await.unwrap();

        let without = QueryRequest::new("kinase", 10).with_fields(["id"]);
        let results = backend.query(&without).await.unwrap();
        assert_eq!(results.ids(), vec!["1"]);
        assert!(results.max_score.is_none());

        let with = QueryRequest::new("kinase", 10).with_fields(["id", "score"]);
        let results = backend.query(&with).await.unwrap();
        assert!(results.max_score.unwrap() > 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_commits_on_blocking_pool() {
        let backend = Arc::new(EmbeddedBackend::open_in_ram().unwrap());

        let mut handles = Vec::new();
        for i in 0..4 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend
                    .add_documents(&[doc(&i.to_string(), "parallel")])
                    .await
                    .unwrap();
                backend.commit().await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let results = backend
            .query(&QueryRequest::new("parallel", 10))
            .await
            .unwrap();
        assert_eq!(results.num_found, 4);
        backend.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_rows_rejected() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        let err = backend.query(&QueryRequest::new("x", 0)).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_shutdown_once() {
        let backend = EmbeddedBackend::open_in_ram().unwrap();
        backend.ping().await.unwrap();

        backend.shutdown().await.unwrap();

        assert!(matches!(
            backend.shutdown().await,
            Err(SearchError::ShutdownError(_))
        ));
        assert!(matches!(
            backend.add_documents(&[doc("1", "late")]).await,
            Err(SearchError::IndexError(_))
        ));
        assert!(matches!(
            backend.ping().await,
            Err(SearchError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_reopen_core_from_disk() {
        let dir = tempfile::tempdir().unwrap();

        let backend = EmbeddedBackend::open(dir.path()).unwrap();
        backend.add_documents(&[doc("42", "persisted")]).await.unwrap();
        backend.commit().await.unwrap();
        backend.shutdown().await.unwrap();
        drop(backend);

        let reopened = EmbeddedBackend::open(dir.path()).unwrap();
        assert_eq!(reopened.core_path(), Some(dir.path()));
        let results = reopened.query(&QueryRequest::new("persisted", 10)).await.unwrap();
        assert_eq!(results.ids(), vec!["42"]);
        reopened.shutdown().await.unwrap();
    }

    #[test]
    fn test_collect_text_flattens_values() {
        let mut out = Vec::new();
        collect_text(&json!(["a", 1, true, null, {"k": "v"}]), &mut out);
        assert_eq!(out, vec!["a", "1", "true", "v"]);
    }
}
