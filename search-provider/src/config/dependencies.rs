//! Dependency initialization and wiring for the search provider.

use tracing::info;

use crate::config::ProviderSettings;
use crate::ProviderError;
use search_provider_repository::{SearchError, SearchProvider};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The connected search provider.
    pub provider: SearchProvider,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`ProviderSettings`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ProviderError)` - If configuration or connection fails
    pub async fn new() -> Result<Self, ProviderError> {
        let settings = ProviderSettings::from_env()?;
        Self::from_settings(&settings).await
    }

    /// Initialize dependencies from explicit settings.
    pub async fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let config = settings.to_provider_config();

        info!(
            embedded = config.embedded,
            server_url = ?config.server_url,
            core_path = ?config.core_path,
            "Initializing dependencies"
        );

        let provider = match SearchProvider::connect(&config).await {
            Ok(provider) => provider,
            Err(SearchError::Config(e)) => {
                return Err(ProviderError::config(format!(
                    "Failed to create search provider: {}",
                    e
                )))
            }
            Err(e) => return Err(e.into()),
        };

        info!(kind = %provider.kind(), "Search provider connection verified");

        Ok(Self { provider })
    }
}
