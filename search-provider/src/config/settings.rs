//! Provider settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use search_provider_repository::{RemotePoolConfig, SearchProviderConfig};

use crate::ProviderError;

/// Default Solr core URL.
pub const DEFAULT_SOLR_URL: &str = "http://localhost:8983/solr/collection1";

/// Connection settings, before validation.
///
/// # Environment Variables
///
/// - `SOLR_URL`: core URL (default: http://localhost:8983/solr/collection1)
/// - `SOLR_PORT`: port applied when the URL has none
/// - `SOLR_EMBEDDED`: `true` to run an in-process core (default: false)
/// - `SOLR_CORE_PATH`: directory of the embedded core
/// - `SOLR_CONNECT_TIMEOUT_MS`: TCP connect timeout
/// - `SOLR_SOCKET_TIMEOUT_MS`: whole-request timeout
/// - `SOLR_MAX_CONNECTIONS`: idle connections kept per host
/// - `SOLR_MAX_RETRIES`: reconnect attempts when a connection cannot be made
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderSettings {
    pub server_url: Option<String>,
    pub server_port: Option<u16>,
    pub embedded: bool,
    pub core_path: Option<PathBuf>,
    pub connect_timeout_ms: Option<u64>,
    pub socket_timeout_ms: Option<u64>,
    pub max_connections: Option<usize>,
    pub max_retries: Option<u32>,
}

impl ProviderSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server_url: lookup("SOLR_URL").filter(|v| !v.trim().is_empty()),
            server_port: parse_var(&lookup, "SOLR_PORT")?,
            embedded: parse_bool(&lookup, "SOLR_EMBEDDED")?.unwrap_or(false),
            core_path: lookup("SOLR_CORE_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            connect_timeout_ms: parse_var(&lookup, "SOLR_CONNECT_TIMEOUT_MS")?,
            socket_timeout_ms: parse_var(&lookup, "SOLR_SOCKET_TIMEOUT_MS")?,
            max_connections: parse_var(&lookup, "SOLR_MAX_CONNECTIONS")?,
            max_retries: parse_var(&lookup, "SOLR_MAX_RETRIES")?,
        })
    }

    /// Build the provider configuration.
    ///
    /// Remote mode falls back to [`DEFAULT_SOLR_URL`]; embedded mode has no
    /// default core path.
    pub fn to_provider_config(&self) -> SearchProviderConfig {
        let defaults = RemotePoolConfig::default();
        let pool = RemotePoolConfig {
            connect_timeout: self
                .connect_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            socket_timeout: self
                .socket_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.socket_timeout),
            max_connections_per_host: self
                .max_connections
                .unwrap_or(defaults.max_connections_per_host),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
        };

        let server_url = if self.embedded {
            self.server_url.clone()
        } else {
            Some(
                self.server_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SOLR_URL.to_string()),
            )
        };

        SearchProviderConfig {
            server_url,
            server_port: self.server_port,
            embedded: self.embedded,
            core_path: self.core_path.clone(),
            pool,
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ProviderError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ProviderError::config(format!("Invalid {}='{}': {}", name, raw, e))),
        _ => Ok(None),
    }
}

fn parse_bool<F>(lookup: &F, name: &str) -> Result<Option<bool>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ProviderError::config(format!(
                "Invalid {}='{}': expected a boolean",
                name, v
            ))),
        },
    }
}
