//! Query request types.

use serde::{Deserialize, Serialize};

/// Pseudo-field carrying the relevance score of a result.
pub const SCORE_FIELD: &str = "score";

/// Field list used when a request does not name one: every stored field
/// plus the relevance score.
pub const DEFAULT_FIELDS: [&str; 2] = ["*", SCORE_FIELD];

/// A query against the search engine.
///
/// The `text` is the raw user query; escaping is applied by the provider at
/// submission time, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Free-text query.
    pub text: String,
    /// Maximum number of documents to return.
    pub max_results: usize,
    /// Explicit field list. `None` means [`DEFAULT_FIELDS`].
    pub fields: Option<Vec<String>>,
}

impl QueryRequest {
    /// Create a request returning all fields plus score.
    pub fn new(text: impl Into<String>, max_results: usize) -> Self {
        Self {
            text: text.into(),
            max_results,
            fields: None,
        }
    }

    /// Restrict the returned fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The effective field list, falling back to [`DEFAULT_FIELDS`].
    pub fn field_list(&self) -> Vec<String> {
        match &self.fields {
            Some(fields) if !fields.is_empty() => fields.clone(),
            _ => DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Whether the effective field list includes every stored field.
    pub fn wants_all_fields(&self) -> bool {
        self.field_list().iter().any(|f| f == "*")
    }

    /// Whether the effective field list includes the relevance score.
    pub fn wants_score(&self) -> bool {
        self.field_list().iter().any(|f| f == SCORE_FIELD)
    }
}
