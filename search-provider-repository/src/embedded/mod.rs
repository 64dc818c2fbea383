//! Embedded implementation of the search backend.
//!
//! Runs a tantivy index in-process. The backend owns the index and its single
//! writer, and must be shut down once when the caller is done with it.

mod backend;
mod schema;

pub use backend::EmbeddedBackend;
pub use schema::{FIELDS_FIELD, SOURCE_FIELD, TEXT_FIELD};
