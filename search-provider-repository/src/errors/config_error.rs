//! Configuration error types.
//!
//! These are raised while resolving a connection configuration, before any
//! backend is constructed.

use thiserror::Error;

/// Errors in the connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Embedded mode was requested without a core path.
    #[error("Embedded mode requires a core path")]
    MissingCorePath,

    /// Remote mode was requested without a server URL.
    #[error("Remote mode requires a server URL")]
    MissingServerUrl,

    /// The server URL could not be parsed.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server URL uses a scheme other than http or https.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// The explicit port disagrees with the port in the server URL.
    #[error("Server port {port} conflicts with port {url_port} in the server URL")]
    PortConflict { port: u16, url_port: u16 },
}

impl ConfigError {
    /// Create an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
