//! # Gigscope - concert data aggregator
//!
//! Gigscope pulls artists, locations, dates and relations from a read-only
//! concert-data API, joins them into chronological concerts, optionally
//! enriches artist search with Spotify, and serves the result as JSON and
//! server-rendered pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Upstream   │────▶│  Fan-out    │────▶│    Cache    │────▶│  Join/Merge │
//! │  (4 JSON)   │     │  (client)   │     │ (snapshot)  │     │ (per read)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                     ┌─────────────┐     ┌─────────────┐            │
//!                     │   Spotify   │────▶│  HTTP API   │◀───────────┘
//!                     │  (search)   │     │  + pages    │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gigscope::{start_server, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gigscope::ServerError> {
//!     start_server(Config::default()).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Upstream collections and derived views
//! - [`parser`] - Date and location slug parsing
//! - [`client`] - Primary upstream fan-out fetch
//! - [`spotify`] - Secondary provider client
//! - [`cache`] - Snapshot cache and refresh policy
//! - [`transform`] - Join and cross-provider unification
//! - [`config`] - Runtime configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Upstream providers
pub mod client;
pub mod spotify;

// Caching
pub mod cache;

// Transformation
pub mod transform;

// Configuration
pub mod config;

// HTTP API
pub mod api;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ApiError, FetchError, ParseError, ServerError, SpotifyError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Artist,
    ArtistSource,
    ArtistWithMeta,
    DataBundle,
    DatesIndex,
    Event,
    LocationIndex,
    LocationName,
    Relation,
    UnifiedArtist,
};

// =============================================================================
// Re-exports - Engine
// =============================================================================

pub use cache::{DataCache, Refresher};
pub use client::UpstreamClient;
pub use parser::{parse_date, split_slug};
pub use spotify::SpotifyClient;
pub use transform::{build_events, merge_artists, merge_unified};

// =============================================================================
// Re-exports - Server
// =============================================================================

pub use api::{router, start_server, AppState};
pub use config::Config;
