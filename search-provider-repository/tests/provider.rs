//! End-to-end tests of `SearchProvider` against both backend kinds.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use search_provider_repository::{
    BackendKind, ConfigError, Document, SearchError, SearchProvider, SearchProviderConfig,
};

#[tokio::test]
async fn embedded_index_commit_query() {
    let dir = tempfile::tempdir().unwrap();
    let provider = SearchProvider::connect(&SearchProviderConfig::embedded(dir.path()))
        .await
        .unwrap();
    assert_eq!(provider.kind(), BackendKind::Embedded);

    let document = Document::new().with_field("id", "42").with_field("text", "hello");
    provider.index_document(&document).await.unwrap();

    let before = provider.run_query("hello", 10).await.unwrap();
    assert!(before.ids().is_empty());

    provider.commit().await.unwrap();

    let after = provider.run_query("hello", 10).await.unwrap();
    assert_eq!(after.ids(), vec!["42"]);
    assert_eq!(after.num_found, 1);

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn embedded_escaped_query_matches_both_terms() {
    let dir = tempfile::tempdir().unwrap();
    let provider = SearchProvider::connect(&SearchProviderConfig::embedded(dir.path()))
        .await
        .unwrap();

    provider
        .index_documents(&[
            Document::new().with_field("id", "1").with_field("text", "DNA replication"),
            Document::new().with_field("id", "2").with_field("text", "RNA splicing"),
            Document::new().with_field("id", "3").with_field("text", "protein folding"),
        ])
        .await
        .unwrap();
    provider.commit().await.unwrap();

    let results = provider.run_query("DNA/RNA", 10).await.unwrap();
    let mut ids = results.ids();
    ids.sort();
    assert_eq!(ids, vec!["1", "2"]);

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn embedded_field_value_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let provider = SearchProvider::connect(&SearchProviderConfig::embedded(dir.path()))
        .await
        .unwrap();

    provider
        .index_document(
            &Document::new()
                .with_field("id", "15342797")
                .with_field("text", json!(["BRCA1 abstract", "appendix"])),
        )
        .await
        .unwrap();
    provider.commit().await.unwrap();

    assert_eq!(
        provider.get_field_value("15342797", "text").await.unwrap(),
        Some(json!("BRCA1 abstract"))
    );
    assert_eq!(provider.get_doc_text("15342797").await.unwrap(), "BRCA1 abstract");
    assert!(provider
        .get_field_value("00000000", "text")
        .await
        .unwrap()
        .is_none());
    assert_eq!(provider.get_doc_text("00000000").await.unwrap(), "");

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn embedded_delete_by_query() {
    let dir = tempfile::tempdir().unwrap();
    let provider = SearchProvider::connect(&SearchProviderConfig::embedded(dir.path()))
        .await
        .unwrap();

    provider
        .index_documents(&[
            Document::new().with_field("id", "1").with_field("text", "obsolete record"),
            Document::new().with_field("id", "2").with_field("text", "current record"),
        ])
        .await
        .unwrap();
    provider.commit().await.unwrap();

    provider.delete_by_query("obsolete").await.unwrap();
    provider.commit().await.unwrap();

    let results = provider.run_query("record", 10).await.unwrap();
    assert_eq!(results.ids(), vec!["2"]);

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn embedded_field_qualified_query_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let provider = SearchProvider::connect(&SearchProviderConfig::embedded(dir.path()))
        .await
        .unwrap();

    provider
        .index_documents(&[
            Document::new().with_field("id", "1").with_field("text", "obsolete record"),
            Document::new().with_field("id", "2").with_field("text", "current record"),
        ])
        .await
        .unwrap();
    provider.commit().await.unwrap();

    let results = provider.run_query("text:record", 10).await.unwrap();
    assert_eq!(results.num_found, 2);

    provider.delete_by_query("text:obsolete").await.unwrap();
    provider.commit().await.unwrap();

    let results = provider.run_query("text:record", 10).await.unwrap();
    assert_eq!(results.ids(), vec!["2"]);

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn embedded_without_core_path_is_config_error() {
    let config = SearchProviderConfig {
        embedded: true,
        core_path: None,
        ..Default::default()
    };

    let result = SearchProvider::connect(&config).await;
    assert!(matches!(
        result,
        Err(SearchError::Config(ConfigError::MissingCorePath))
    ));
}

#[tokio::test]
async fn remote_connect_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/solr/genomics/admin/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/solr/genomics/select"))
        .and(body_string_contains("q=DNA+RNA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "numFound": 2,
                "start": 0,
                "maxScore": 2.0,
                "docs": [
                    {"id": "1", "score": 2.0},
                    {"id": "2", "score": 1.0}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = SearchProviderConfig::remote(format!("{}/solr/genomics", server.uri()));
    let provider = SearchProvider::connect(&config).await.unwrap();
    assert_eq!(provider.kind(), BackendKind::Remote);

    let results = provider.run_query("DNA/RNA", 10).await.unwrap();
    assert_eq!(results.ids(), vec!["1", "2"]);

    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn remote_connect_fails_when_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/solr/genomics/admin/ping"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = SearchProviderConfig::remote(format!("{}/solr/genomics", server.uri()));
    let result = SearchProvider::connect(&config).await;

    assert!(matches!(result, Err(SearchError::ConnectionError(_))));
}
