//! Solr response bodies.

use serde::Deserialize;

use search_provider_shared::{Document, ResultSet};

/// Body of a `/select` response.
#[derive(Debug, Deserialize)]
pub struct SelectResponse {
    pub response: DocList,
}

/// The `response` section of a `/select` response.
#[derive(Debug, Deserialize)]
pub struct DocList {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(rename = "maxScore", default)]
    pub max_score: Option<f32>,
    #[serde(default)]
    pub docs: Vec<Document>,
}

impl From<DocList> for ResultSet {
    fn from(list: DocList) -> Self {
        ResultSet {
            documents: list.docs,
            num_found: list.num_found,
            max_score: list.max_score,
        }
    }
}

/// Body of an `/admin/ping` response.
#[derive(Debug, Deserialize)]
pub struct PingResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
}

/// Extract Solr's error message from a failed response body.
///
/// Falls back to the raw body when it is not a Solr error document.
pub fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error.msg)
        .unwrap_or_else(|| body.trim().to_string());

    format!("Solr returned status {}: {}", status, detail)
}
