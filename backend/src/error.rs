//! Error types for the Gigscope aggregation service.
//!
//! This module defines one error type per layer:
//!
//! - [`ParseError`] - Upstream date string parsing errors
//! - [`FetchError`] - Primary upstream API errors (fan-out fetch)
//! - [`SpotifyError`] - Secondary provider errors
//! - [`ApiError`] - Request-boundary errors, rendered as JSON responses
//! - [`ServerError`] - Startup and serve-loop errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

// =============================================================================
// Parsing Errors
// =============================================================================

/// Errors while parsing upstream date strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing left after stripping the unconfirmed marker and whitespace.
    #[error("empty date")]
    EmptyDate,

    /// Neither `YYYY-MM-DD` nor `DD-MM-YYYY` matched.
    #[error("unrecognized date format: {0:?}")]
    InvalidDate(String),
}

// =============================================================================
// Upstream Fetch Errors
// =============================================================================

/// Errors from the primary upstream API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connection refused, reset, client timeout).
    #[error("upstream request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status.
    #[error("upstream {endpoint} returned {status}")]
    Status {
        endpoint: &'static str,
        status: u16,
    },

    /// Body was not one of the accepted JSON shapes.
    #[error("failed to decode upstream {endpoint}: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    /// The orchestrator deadline elapsed before all calls completed.
    #[error("upstream fetch timed out after {0:?}")]
    TimedOut(std::time::Duration),

    /// Another caller's fetch, which this one waited for, failed with this message.
    #[error("{0}")]
    Shared(String),
}

// =============================================================================
// Secondary Provider Errors
// =============================================================================

/// Errors from the Spotify client.
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// Client id or secret not configured.
    #[error("spotify credentials are missing")]
    MissingCredentials,

    /// Lookup by id found nothing.
    #[error("spotify artist not found: {0}")]
    NotFound(String),

    /// Transport failure, non-2xx status or incomplete data.
    #[error("spotify upstream error: {0}")]
    Upstream(String),

    /// Body could not be decoded.
    #[error("invalid spotify response: {0}")]
    InvalidResponse(String),

    /// Lookup requested without an id.
    #[error("spotify artist id is required")]
    EmptyId,
}

// =============================================================================
// API Errors
// =============================================================================

/// Request-boundary errors.
///
/// Every variant maps to one HTTP status and a `{"error", "status"}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request parameter.
    #[error("{0}")]
    BadRequest(String),

    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A feature is not configured on this instance.
    #[error("{0}")]
    Unavailable(String),

    /// The cache is empty and populating it failed.
    #[error("upstream data unavailable: {0}")]
    Upstream(#[from] FetchError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Upstream(ref err) = self {
            tracing::error!(error = %err, "serving request without data");
        }
        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] FetchError),

    #[error("failed to build spotify client: {0}")]
    Spotify(#[from] SpotifyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for upstream fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for Spotify operations.
pub type SpotifyResult<T> = Result<T, SpotifyError>;

/// Result type for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;
