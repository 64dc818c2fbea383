//! # Search Provider
//!
//! Entry point wiring for the search provider: reads connection settings
//! from the environment and builds a connected `SearchProvider`.

pub mod config;

pub use config::{Dependencies, ProviderSettings};

use thiserror::Error;

/// Errors that can occur while configuring or running the provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_provider_repository::SearchError),

    /// Input document could not be decoded.
    #[error("Invalid document: {0}")]
    DocumentError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProviderError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
