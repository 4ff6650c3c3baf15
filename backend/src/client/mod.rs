//! Client for the primary concert-data API.
//!
//! Four read-only collections live under one base URL:
//!
//! | Path         | Shape                          |
//! |--------------|--------------------------------|
//! | `/artists`   | `[Artist, ...]`                |
//! | `/locations` | `{"index": [LocationIndex]}`   |
//! | `/dates`     | `{"index": [DatesIndex]}`      |
//! | `/relation`  | `{"index": [Relation]}`        |
//!
//! Every collection is accepted in either shape (bare array or `index`
//! wrapper). [`UpstreamClient::fetch_all`] fetches the four concurrently and
//! returns them as one [`DataBundle`], or the first failure in the fixed
//! order artists, locations, dates, relations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gigscope::client::UpstreamClient;
//! use std::time::Duration;
//!
//! let client = UpstreamClient::new("https://groupietrackers.herokuapp.com/api", Duration::from_secs(10))?;
//! let bundle = client.fetch_all().await?;
//! println!("{} artists", bundle.artists.len());
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FetchError, FetchResult};
use crate::models::{Artist, DataBundle, DatesIndex, LocationIndex, Relation};

/// Public Groupie Tracker API.
pub const DEFAULT_API_BASE: &str = "https://groupietrackers.herokuapp.com/api";

/// Default per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The four upstream collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Artists,
    Locations,
    Dates,
    Relations,
}

impl Endpoint {
    /// Path below the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Artists => "/artists",
            Self::Locations => "/locations",
            Self::Dates => "/dates",
            Self::Relations => "/relation",
        }
    }

    /// Short name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Artists => "artists",
            Self::Locations => "locations",
            Self::Dates => "dates",
            Self::Relations => "relations",
        }
    }
}

/// HTTP client for the primary API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base_url: String,
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Create a client for `base_url`.
    ///
    /// Trailing slashes are trimmed; a blank base falls back to
    /// [`DEFAULT_API_BASE`]. `timeout` bounds each individual call.
    pub fn new(base_url: &str, timeout: Duration) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Request {
                endpoint: "client",
                source,
            })?;

        Ok(Self::with_http(base_url, http))
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = if trimmed.is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            trimmed.to_string()
        };
        Self { base_url, http }
    }

    /// Normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join the base URL and a path with exactly one `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn fetch_artists(&self) -> FetchResult<Vec<Artist>> {
        self.fetch(Endpoint::Artists).await
    }

    pub async fn fetch_locations(&self) -> FetchResult<Vec<LocationIndex>> {
        self.fetch(Endpoint::Locations).await
    }

    pub async fn fetch_dates(&self) -> FetchResult<Vec<DatesIndex>> {
        self.fetch(Endpoint::Dates).await
    }

    pub async fn fetch_relations(&self) -> FetchResult<Vec<Relation>> {
        self.fetch(Endpoint::Relations).await
    }

    /// Fetch the four collections concurrently as one bundle.
    ///
    /// Waits for all four calls. If any failed, no bundle is returned and the
    /// error is the first failure in the order artists, locations, dates,
    /// relations. Dropping the returned future cancels every call in flight.
    pub async fn fetch_all(&self) -> FetchResult<DataBundle> {
        let (artists, locations, dates, relations) = tokio::join!(
            self.fetch_artists(),
            self.fetch_locations(),
            self.fetch_dates(),
            self.fetch_relations(),
        );

        // Fields are evaluated in order, so `?` applies the priority rule.
        Ok(DataBundle {
            artists: artists?,
            locations: locations?,
            dates: dates?,
            relations: relations?,
        })
    }

    /// Fetch and decode one collection.
    async fn fetch<T: DeserializeOwned>(&self, endpoint: Endpoint) -> FetchResult<Vec<T>> {
        let url = self.url(endpoint.path());
        tracing::debug!(endpoint = endpoint.name(), %url, "fetching upstream collection");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                endpoint: endpoint.name(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint.name(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Request {
            endpoint: endpoint.name(),
            source,
        })?;

        decode_collection(&body).map_err(|message| FetchError::Decode {
            endpoint: endpoint.name(),
            message,
        })
    }
}

/// Decode a collection sent either as a bare array or as `{"index": [...]}`.
pub fn decode_collection<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, String> {
    let payload: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;

    let items = match payload {
        Value::Array(_) => payload,
        Value::Object(mut map) => match map.remove("index") {
            Some(index @ Value::Array(_)) => index,
            Some(_) => return Err("\"index\" is not an array".to_string()),
            None => return Err("object without \"index\" field".to_string()),
        },
        other => return Err(format!("expected array or index object, got {}", kind_of(&other))),
    };

    serde_json::from_value(items).map_err(|e| e.to_string())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
