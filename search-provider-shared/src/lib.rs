//! # Search Provider Shared
//!
//! Data types shared by the search provider crates: the document model used
//! both for indexing input and query results, query requests, and result sets.

mod document;
mod query;
mod results;

pub use document::Document;
pub use query::{QueryRequest, DEFAULT_FIELDS, SCORE_FIELD};
pub use results::ResultSet;

/// Name of the unique key field every indexed document carries.
pub const ID_FIELD: &str = "id";
