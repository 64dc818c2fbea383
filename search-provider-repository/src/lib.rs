//! # Search Provider Repository
//!
//! This crate provides the `SearchBackend` trait, its two implementations
//! (a remote Solr client and an embedded tantivy engine), and the
//! `SearchProvider` facade that selects between them at construction.

pub mod client;
pub mod config;
pub mod embedded;
pub mod errors;
pub mod escape;
pub mod interfaces;
pub mod solr;

pub use client::SearchProvider;
pub use config::{ConnectionMode, RemotePoolConfig, SearchProviderConfig};
pub use embedded::EmbeddedBackend;
pub use errors::{ConfigError, SearchError};
pub use escape::escape_query;
pub use interfaces::{BackendKind, SearchBackend};
pub use solr::SolrBackend;

pub use search_provider_shared::{Document, QueryRequest, ResultSet};
