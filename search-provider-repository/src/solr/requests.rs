//! Solr request builders.
//!
//! Parameters for `/select` and JSON bodies for `/update`.

use serde_json::{json, Value};

use search_provider_shared::{QueryRequest, ID_FIELD};

/// Relative path of the query handler.
pub const SELECT_PATH: &str = "select";

/// Relative path of the update handler.
pub const UPDATE_PATH: &str = "update";

/// Relative path of the ping handler.
pub const PING_PATH: &str = "admin/ping";

/// Form parameters for a `/select` request.
pub fn select_params(request: &QueryRequest) -> Vec<(&'static str, String)> {
    vec![
        ("q", request.text.clone()),
        ("rows", request.max_results.to_string()),
        ("fl", request.field_list().join(",")),
        ("wt", "json".to_string()),
    ]
}

/// Form parameters for an exact identifier lookup.
///
/// Uses the `term` query parser so the identifier is matched verbatim,
/// without any query syntax interpretation.
pub fn id_lookup_params(id: &str, fields: &[String]) -> Vec<(&'static str, String)> {
    vec![
        ("q", format!("{{!term f={}}}{}", ID_FIELD, id)),
        ("rows", "1".to_string()),
        ("fl", fields.join(",")),
        ("wt", "json".to_string()),
    ]
}

/// Update body committing pending changes.
pub fn commit_body() -> Value {
    json!({ "commit": {} })
}

/// Update body deleting every document matching `query`.
pub fn delete_by_query_body(query: &str) -> Value {
    json!({ "delete": { "query": query } })
}
