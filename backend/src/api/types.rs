//! REST API types: query parameters and response bodies.
//!
//! Query parameters are taken as raw strings. Numeric filters that don't
//! parse are ignored rather than rejected, so `?year=abc` behaves like no
//! year filter at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ArtistSource;
use crate::spotify::{pick_best_image, SpotifyArtist};

// =============================================================================
// Query Parameters
// =============================================================================

/// `GET /api/artists`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArtistsQuery {
    /// Case-insensitive substring of the artist name.
    pub name: Option<String>,
    /// Exact creation year.
    pub year: Option<String>,
    /// Case-insensitive substring of any member name.
    pub member: Option<String>,
    /// `groupie`, `spotify` or `all`.
    pub source: Option<String>,
    /// `spotify` adds secondary results.
    pub external: Option<String>,
    /// Secondary result count.
    pub limit: Option<String>,
}

/// `GET /api/locations`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationsQuery {
    pub country: Option<String>,
    pub city: Option<String>,
    pub artist: Option<String>,
}

/// `GET /api/dates`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatesQuery {
    pub year: Option<String>,
}

/// `GET /api/relation`, `GET /api/spotify/artist` and the detail pages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// `GET /api/events`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventsQuery {
    pub country: Option<String>,
    pub city: Option<String>,
    pub artist: Option<String>,
    pub year: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// One location an artist played, with the number of concerts there.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    pub artist_id: i64,
    pub artist_name: String,
    pub city: String,
    pub country: String,
    pub raw: String,
    pub event_count: usize,
}

/// Spotify artist detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotifyArtistDetail {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub genres: Vec<String>,
    pub popularity: u32,
    pub followers: u64,
    pub source: ArtistSource,
}

impl From<SpotifyArtist> for SpotifyArtistDetail {
    fn from(artist: SpotifyArtist) -> Self {
        Self {
            image_url: pick_best_image(&artist.images),
            id: artist.id,
            name: artist.name,
            genres: artist.genres,
            popularity: artist.popularity,
            followers: artist.followers.total,
            source: ArtistSource::Secondary,
        }
    }
}

/// `POST /api/refresh`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub status: &'static str,
    pub artists: usize,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::{SpotifyFollowers, SpotifyImage};

    #[test]
    fn test_spotify_detail_from_artist() {
        let detail = SpotifyArtistDetail::from(SpotifyArtist {
            id: "x1".into(),
            name: "Daft Punk".into(),
            genres: vec!["french house".into()],
            popularity: 81,
            images: vec![SpotifyImage { url: "https://img/dp".into(), ..Default::default() }],
            followers: SpotifyFollowers { total: 9_000_000 },
        });

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["image_url"], "https://img/dp");
        assert_eq!(json["followers"], 9_000_000);
        assert_eq!(json["source"], "spotify");
    }

    #[test]
    fn test_location_view_wire_shape() {
        let view = LocationView {
            artist_id: 1,
            artist_name: "Queen".into(),
            city: "London".into(),
            country: "Uk".into(),
            raw: "london-uk".into(),
            event_count: 2,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["artistId"], 1);
        assert_eq!(json["eventCount"], 2);
    }
}
