//! Spotify Web API client (secondary artist provider).
//!
//! Uses the client-credentials flow: the access token is requested on first
//! use and reused until shortly before it expires. Only two calls are made,
//! an artist search and a lookup by id.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gigscope::spotify::SpotifyClient;
//! use std::time::Duration;
//!
//! let client = SpotifyClient::new(&client_id, &client_secret, Duration::from_secs(8))?;
//! let hits = client.search_artists("gorillaz", 8).await?;
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{SpotifyError, SpotifyResult};

/// Client-credentials token endpoint.
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Web API base.
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Default timeout for every Spotify call.
pub const DEFAULT_SPOTIFY_TIMEOUT: Duration = Duration::from_secs(8);

/// Result count used when the requested limit is out of range.
pub const DEFAULT_SEARCH_LIMIT: i64 = 8;

/// Largest accepted search limit.
pub const MAX_SEARCH_LIMIT: i64 = 20;

/// A cached token is replaced this long before it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

// =============================================================================
// Wire Types
// =============================================================================

/// The subset of a Spotify artist object we use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: u32,
    pub images: Vec<SpotifyImage>,
    pub followers: SpotifyFollowers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyImage {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyFollowers {
    pub total: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    artists: SearchPage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchPage {
    items: Vec<SpotifyArtist>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

// =============================================================================
// Client
// =============================================================================

/// Spotify client with a shared, lazily refreshed access token.
pub struct SpotifyClient {
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("client_id", &self.client_id)
            .field("token_url", &self.token_url)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl SpotifyClient {
    /// Create a client. Credentials are trimmed; blank ones are accepted
    /// here and rejected on first use with [`SpotifyError::MissingCredentials`].
    pub fn new(client_id: &str, client_secret: &str, timeout: Duration) -> SpotifyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpotifyError::Upstream(e.to_string()))?;

        Ok(Self {
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            api_base: SPOTIFY_API_BASE.to_string(),
            http,
            token: Mutex::new(None),
        })
    }

    /// Point the client at other token and API endpoints.
    pub fn with_endpoints(mut self, token_url: &str, api_base: &str) -> Self {
        self.token_url = token_url.to_string();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Both credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Search artists by free text.
    ///
    /// A blank query returns no results without calling Spotify. `limit`
    /// outside `1..=20` becomes [`DEFAULT_SEARCH_LIMIT`]. Results without a
    /// name or image, and results with a popularity between 1 and 4, are
    /// dropped.
    pub async fn search_artists(&self, query: &str, limit: i64) -> SpotifyResult<Vec<SpotifyArtist>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let token = self.access_token().await?;
        let limit = effective_limit(limit);
        let limit_param = limit.to_string();

        let response = self
            .http
            .get(format!("{}/search", self.api_base))
            .query(&[("q", query), ("type", "artist"), ("limit", limit_param.as_str())])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| SpotifyError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Upstream(format!("search failed: {}", status.as_u16())));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::InvalidResponse(e.to_string()))?;

        let hits: Vec<SpotifyArtist> = payload
            .artists
            .items
            .into_iter()
            .filter(is_useful_hit)
            .collect();

        tracing::debug!(query, limit, hits = hits.len(), "spotify search");
        Ok(hits)
    }

    /// Fetch one artist by id.
    pub async fn get_artist(&self, id: &str) -> SpotifyResult<SpotifyArtist> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SpotifyError::EmptyId);
        }

        let token = self.access_token().await?;

        let mut url = reqwest::Url::parse(&format!("{}/artists", self.api_base))
            .map_err(|e| SpotifyError::Upstream(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SpotifyError::Upstream(format!("invalid api base: {}", self.api_base)))?
            .push(id);

        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| SpotifyError::Upstream(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SpotifyError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            return Err(SpotifyError::Upstream(format!("artist fetch failed: {}", status.as_u16())));
        }

        let artist: SpotifyArtist = response
            .json()
            .await
            .map_err(|e| SpotifyError::InvalidResponse(e.to_string()))?;

        if artist.name.trim().is_empty() || artist.images.is_empty() {
            return Err(SpotifyError::Upstream("incomplete artist data".to_string()));
        }

        Ok(artist)
    }

    /// Return the cached token, requesting a new one when it is missing or
    /// about to expire. Concurrent callers wait on the same request.
    async fn access_token(&self) -> SpotifyResult<String> {
        let mut guard = self.token.lock().await;

        if !self.is_configured() {
            return Err(SpotifyError::MissingCredentials);
        }

        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SpotifyError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::Upstream(format!("token request failed: {}", status.as_u16())));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::InvalidResponse(e.to_string()))?;

        if payload.access_token.is_empty() {
            return Err(SpotifyError::InvalidResponse("empty access token".to_string()));
        }

        tracing::debug!(expires_in = payload.expires_in, "spotify token acquired");

        let value = payload.access_token;
        *guard = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(payload.expires_in),
        });
        Ok(value)
    }
}

/// First image when it has a URL (Spotify lists the largest first),
/// otherwise the first image that has one, otherwise empty.
pub fn pick_best_image(images: &[SpotifyImage]) -> String {
    images
        .iter()
        .map(|image| image.url.as_str())
        .find(|url| !url.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn effective_limit(limit: i64) -> i64 {
    if (1..=MAX_SEARCH_LIMIT).contains(&limit) {
        limit
    } else {
        DEFAULT_SEARCH_LIMIT
    }
}

fn is_useful_hit(artist: &SpotifyArtist) -> bool {
    !artist.name.trim().is_empty()
        && !artist.images.is_empty()
        && !(1..5).contains(&artist.popularity)
}
