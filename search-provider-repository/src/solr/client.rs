//! Solr client implementation.
//!
//! This module provides the concrete implementation of `SearchBackend`
//! against a remote Solr core, using `reqwest` for transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::RemotePoolConfig;
use crate::errors::SearchError;
use crate::interfaces::{BackendKind, SearchBackend};
use crate::solr::requests::{
    commit_body, delete_by_query_body, id_lookup_params, select_params, PING_PATH, SELECT_PATH,
    UPDATE_PATH,
};
use crate::solr::response::{error_message, PingResponse, SelectResponse};
use search_provider_shared::{Document, QueryRequest, ResultSet};

/// Delay before the first connection retry.
const INITIAL_RETRY_DELAY_MS: u64 = 100;

/// Upper bound on the delay between connection retries.
const MAX_RETRY_DELAY_MS: u64 = 2_000;

/// Solr backend bound to one core URL.
///
/// The underlying `reqwest::Client` pools connections and is shared by all
/// concurrent calls. The remote server's lifecycle is never managed here.
///
/// # Example
///
/// ```ignore
/// let url = Url::parse("http://localhost:8983/solr/genomics-simple/")?;
/// let backend = SolrBackend::connect(url, &RemotePoolConfig::default()).await?;
/// let results = backend.query(&QueryRequest::new("BRCA1", 10)).await?;
/// ```
pub struct SolrBackend {
    http: Client,
    base_url: Url,
    max_retries: u32,
}

impl SolrBackend {
    /// Build a client for the core at `base_url` without contacting it.
    ///
    /// `base_url` must end with `/` so endpoint paths join beneath it;
    /// `SearchProviderConfig::connection_mode` guarantees this.
    pub fn new(base_url: Url, pool: &RemotePoolConfig) -> Result<Self, SearchError> {
        let http = Client::builder()
            .connect_timeout(pool.connect_timeout)
            .timeout(pool.socket_timeout)
            .pool_max_idle_per_host(pool.max_connections_per_host)
            .gzip(true)
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(
            url = %base_url,
            connect_timeout_ms = pool.connect_timeout.as_millis() as u64,
            socket_timeout_ms = pool.socket_timeout.as_millis() as u64,
            max_connections_per_host = pool.max_connections_per_host,
            max_retries = pool.max_retries,
            "Created Solr client"
        );

        Ok(Self {
            http,
            base_url,
            max_retries: pool.max_retries,
        })
    }

    /// Build a client and verify the core answers a ping.
    pub async fn connect(base_url: Url, pool: &RemotePoolConfig) -> Result<Self, SearchError> {
        let backend = Self::new(base_url, pool)?;
        backend.ping().await?;
        Ok(backend)
    }

    /// The core URL this client is bound to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SearchError> {
        self.base_url
            .join(path)
            .map_err(|e| SearchError::connection(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Send a request, retrying only when no connection could be established.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, reqwest::Error> {
        let mut attempt = 0;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        loop {
            let Some(current) = request.try_clone() else {
                return request.send().await;
            };

            match current.send().await {
                Err(e) if e.is_connect() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt = attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Connection to Solr failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = std::cmp::min(delay_ms * 2, MAX_RETRY_DELAY_MS);
                }
                result => return result,
            }
        }
    }

    /// Send a request and decode a successful JSON body.
    ///
    /// Transport failures and non-success statuses are both reported through
    /// `to_error`, so each operation surfaces a single failure kind.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        to_error: fn(String) -> SearchError,
    ) -> Result<T, SearchError> {
        let response = self
            .execute(request)
            .await
            .map_err(|e| to_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Solr request failed");
            return Err(to_error(error_message(status, &error_body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))
    }

    /// Post a JSON body to the update handler.
    async fn update<B: serde::Serialize + ?Sized>(
        &self,
        body: &B,
        to_error: fn(String) -> SearchError,
    ) -> Result<(), SearchError> {
        let url = self.endpoint(UPDATE_PATH)?;
        let request = self.http.post(url).query(&[("wt", "json")]).json(body);
        self.send_json::<serde_json::Value>(request, to_error).await?;
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for SolrBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    #[instrument(skip(self, request), fields(rows = request.max_results))]
    async fn query(&self, request: &QueryRequest) -> Result<ResultSet, SearchError> {
        let url = self.endpoint(SELECT_PATH)?;
        let request = self.http.post(url).form(&select_params(request));

        let response: SelectResponse = self.send_json(request, SearchError::QueryError).await?;

        debug!(
            num_found = response.response.num_found,
            returned = response.response.docs.len(),
            "Query completed"
        );
        Ok(response.response.into())
    }

    async fn find_by_id(
        &self,
        id: &str,
        fields: &[String],
    ) -> Result<Option<Document>, SearchError> {
        let url = self.endpoint(SELECT_PATH)?;
        let request = self.http.post(url).form(&id_lookup_params(id, fields));

        let response: SelectResponse = self.send_json(request, SearchError::QueryError).await?;

        Ok(response.response.docs.into_iter().next())
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn add_documents(&self, documents: &[Document]) -> Result<(), SearchError> {
        self.update(documents, SearchError::IndexError).await?;
        debug!("Documents submitted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn commit(&self) -> Result<(), SearchError> {
        self.update(&commit_body(), SearchError::CommitError).await?;
        debug!("Commit completed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_query(&self, query: &str) -> Result<(), SearchError> {
        self.update(&delete_by_query_body(query), SearchError::DeleteError)
            .await?;
        debug!("Delete by query submitted");
        Ok(())
    }

    async fn ping(&self) -> Result<(), SearchError> {
        let url = self.endpoint(PING_PATH)?;
        let request = self.http.get(url).query(&[("wt", "json")]);

        let response: PingResponse = self
            .send_json(request, SearchError::ConnectionError)
            .await?;

        if response.status != "OK" {
            return Err(SearchError::connection(format!(
                "Solr ping returned status {}",
                response.status
            )));
        }
        Ok(())
    }
}
