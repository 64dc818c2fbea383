//! Connection configuration for the search provider.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::errors::ConfigError;

/// HTTP client settings for remote mode.
///
/// These are applied once when the client is built and passed straight
/// through to the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePoolConfig {
    /// Time allowed to establish a TCP connection.
    pub connect_timeout: Duration,
    /// Time allowed for a whole request, including reading the response.
    pub socket_timeout: Duration,
    /// Maximum idle connections kept open per host.
    pub max_connections_per_host: usize,
    /// Extra attempts made when a connection cannot be established.
    pub max_retries: u32,
}

impl Default for RemotePoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            socket_timeout: Duration::from_secs(30),
            max_connections_per_host: 10,
            max_retries: 0,
        }
    }
}

/// Configuration for constructing a `SearchProvider`.
///
/// `embedded = true` requires `core_path`; `embedded = false` requires
/// `server_url`. The connection target is always explicit.
#[derive(Debug, Clone, Default)]
pub struct SearchProviderConfig {
    /// Base URL of the remote core, e.g. `http://localhost:8983/solr/docs`.
    pub server_url: Option<String>,
    /// Port to apply when the URL does not carry one.
    pub server_port: Option<u16>,
    /// Run an in-process engine instead of connecting to a server.
    pub embedded: bool,
    /// Directory holding the embedded core.
    pub core_path: Option<PathBuf>,
    /// HTTP client settings for remote mode.
    pub pool: RemotePoolConfig,
}

impl SearchProviderConfig {
    /// Create a remote-mode config for the given server URL.
    pub fn remote(server_url: impl Into<String>) -> Self {
        Self {
            server_url: Some(server_url.into()),
            ..Default::default()
        }
    }

    /// Create an embedded-mode config for the given core directory.
    pub fn embedded(core_path: impl Into<PathBuf>) -> Self {
        Self {
            embedded: true,
            core_path: Some(core_path.into()),
            ..Default::default()
        }
    }

    /// Set the server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.server_port = Some(port);
        self
    }

    /// Set the HTTP client settings.
    pub fn with_pool(mut self, pool: RemotePoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Validate the configuration and resolve it into a connection mode.
    pub fn connection_mode(&self) -> Result<ConnectionMode, ConfigError> {
        if self.embedded {
            let core_path = self
                .core_path
                .clone()
                .filter(|p| !p.as_os_str().is_empty())
                .ok_or(ConfigError::MissingCorePath)?;
            return Ok(ConnectionMode::Embedded { core_path });
        }

        let raw_url = self
            .server_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingServerUrl)?;

        let url = resolve_server_url(raw_url, self.server_port)?;

        Ok(ConnectionMode::Remote {
            url,
            pool: self.pool.clone(),
        })
    }
}

/// A validated connection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    /// In-process engine stored at `core_path`.
    Embedded { core_path: PathBuf },
    /// HTTP client bound to the core at `url`. The path always ends in `/`.
    Remote { url: Url, pool: RemotePoolConfig },
}

/// Parse the server URL, apply the explicit port and normalize the path so
/// endpoint names can be joined onto it.
fn resolve_server_url(raw: &str, port: Option<u16>) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::invalid_url(raw, e))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    }

    if let Some(port) = port {
        match url.port() {
            Some(url_port) if url_port != port => {
                return Err(ConfigError::PortConflict { port, url_port });
            }
            Some(_) => {}
            None => url
                .set_port(Some(port))
                .map_err(|_| ConfigError::invalid_url(raw, "cannot carry a port"))?,
        }
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
