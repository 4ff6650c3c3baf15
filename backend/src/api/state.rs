//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::cache::{DataCache, Refresher};
use crate::client::UpstreamClient;
use crate::config::Config;
use crate::error::ServerError;
use crate::spotify::SpotifyClient;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Fills and refreshes the upstream data cache.
    pub refresher: Arc<Refresher>,

    /// Secondary provider, present only when credentials are configured.
    pub spotify: Option<Arc<SpotifyClient>>,
}

impl AppState {
    /// Build clients and an empty cache from configuration.
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let config = config.normalized();

        let client = UpstreamClient::new(&config.api_base, config.fetch_timeout)?;
        let refresher = Refresher::new(client, Arc::new(DataCache::new()), config.fetch_timeout);

        let spotify = if config.spotify_enabled() {
            let client = SpotifyClient::new(
                &config.spotify_client_id,
                &config.spotify_client_secret,
                config.secondary_timeout,
            )?;
            Some(Arc::new(client))
        } else {
            None
        };

        tracing::info!(
            api_base = %config.api_base,
            static_dir = %config.static_dir.display(),
            spotify = spotify.is_some(),
            fetch_timeout_ms = config.fetch_timeout.as_millis() as u64,
            "application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            refresher: Arc::new(refresher),
            spotify,
        })
    }

    /// Replace the secondary provider.
    pub fn with_spotify(mut self, client: SpotifyClient) -> Self {
        self.spotify = Some(Arc::new(client));
        self
    }

    pub fn cache(&self) -> &DataCache {
        self.refresher.cache()
    }
}
