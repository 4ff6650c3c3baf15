//! JSON endpoint handlers.
//!
//! Every handler that reads upstream data first makes sure the cache has
//! been filled; when it is empty and the fetch fails the request ends in a
//! 502 through [`ApiError::Upstream`].

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};

use super::filters::{
    dates_in_year, location_views, positive_filter, secondary_limit, ArtistFilter, EventFilter,
    LocationFilter, SourceSelection,
};
use super::logs::log_warning;
use super::state::AppState;
use super::types::{
    ArtistsQuery, DatesQuery, EventsQuery, HealthResponse, IdQuery, LocationView, LocationsQuery,
    RefreshResponse, SpotifyArtistDetail,
};
use crate::error::{ApiError, ApiResult, SpotifyError};
use crate::models::{ArtistWithMeta, DataBundle, DatesIndex, Event, Relation, UnifiedArtist};
use crate::transform::{from_primary, from_secondary, merge_unified};

const SPOTIFY_DISABLED: &str = "spotify integration is not configured";

// =============================================================================
// Snapshot access
// =============================================================================

async fn snapshot(state: &AppState) -> ApiResult<DataBundle> {
    state.refresher.ensure_populated().await?;
    Ok(state.cache().snapshot().unwrap_or_default())
}

async fn artists(state: &AppState) -> ApiResult<Vec<ArtistWithMeta>> {
    state.refresher.ensure_populated().await?;
    Ok(state.cache().artists_with_meta().unwrap_or_default())
}

async fn events(state: &AppState) -> ApiResult<Vec<Event>> {
    state.refresher.ensure_populated().await?;
    Ok(state.cache().events().unwrap_or_default())
}

// =============================================================================
// Artists
// =============================================================================

/// `GET /api/artists`
///
/// Plain [`ArtistWithMeta`] list unless a unified response is selected via
/// `source` / `external`, in which case primary and secondary results are
/// merged into [`UnifiedArtist`] records.
pub async fn list_artists(
    State(state): State<AppState>,
    Query(query): Query<ArtistsQuery>,
) -> ApiResult<Response> {
    let filter = ArtistFilter::from_query(&query);
    let selection = SourceSelection::from_query(&query);

    let filtered: Vec<ArtistWithMeta> = artists(&state)
        .await?
        .into_iter()
        .filter(|artist| filter.matches(artist))
        .collect();

    if !selection.unified {
        return Ok(Json(filtered).into_response());
    }

    if state.spotify.is_none() && !selection.primary {
        return Err(ApiError::Unavailable(SPOTIFY_DISABLED.to_string()));
    }

    let primary: Vec<UnifiedArtist> = if selection.primary {
        filtered.iter().map(from_primary).collect()
    } else {
        Vec::new()
    };

    let secondary = if selection.secondary && !filter.name.is_empty() {
        search_secondary(&state, &filter.name, secondary_limit(&query)).await
    } else {
        Vec::new()
    };

    Ok(Json(merge_unified(primary, secondary)).into_response())
}

/// Secondary search, degraded to no results on any failure.
async fn search_secondary(state: &AppState, name: &str, limit: i64) -> Vec<UnifiedArtist> {
    let Some(spotify) = state.spotify.as_ref() else {
        return Vec::new();
    };

    let timeout = state.config.secondary_timeout;
    let outcome = tokio::time::timeout(timeout, spotify.search_artists(name, limit))
        .await
        .unwrap_or_else(|_| Err(SpotifyError::Upstream(format!("search timed out after {timeout:?}"))));

    match outcome {
        Ok(hits) => hits
            .iter()
            .map(from_secondary)
            .filter(|u| !u.image_url.trim().is_empty() && !u.name.trim().is_empty())
            .collect(),
        Err(err) => {
            log_warning(format!("Spotify search failed, serving primary results only: {err}"));
            Vec::new()
        }
    }
}

/// `GET /api/artists/{id}`
pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArtistWithMeta>> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid artist id: {id:?}")))?;

    artists(&state)
        .await?
        .into_iter()
        .find(|artist| artist.artist.id == id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("artist {id} not found")))
}

// =============================================================================
// Locations, dates, relations, events
// =============================================================================

/// `GET /api/locations`
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationsQuery>,
) -> ApiResult<Json<Vec<LocationView>>> {
    let filter = LocationFilter::from_query(&query);
    let bundle = snapshot(&state).await?;

    let views = location_views(&bundle)
        .into_iter()
        .filter(|view| filter.matches(view))
        .collect();

    Ok(Json(views))
}

/// `GET /api/dates`
pub async fn list_dates(
    State(state): State<AppState>,
    Query(query): Query<DatesQuery>,
) -> ApiResult<Json<Vec<DatesIndex>>> {
    let year = positive_filter(query.year.as_deref());
    let bundle = snapshot(&state).await?;
    Ok(Json(dates_in_year(bundle.dates, year)))
}

/// `GET /api/relation`
pub async fn list_relations(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<Vec<Relation>>> {
    let id = positive_filter(query.id.as_deref());
    let relations = snapshot(&state).await?.relations;

    if id == 0 {
        return Ok(Json(relations));
    }

    Ok(Json(relations.into_iter().filter(|r| r.id == id).take(1).collect()))
}

/// `GET /api/events`
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let filter = EventFilter::from_query(&query);

    let filtered = events(&state)
        .await?
        .into_iter()
        .filter(|event| filter.matches(event))
        .collect();

    Ok(Json(filtered))
}

// =============================================================================
// Spotify
// =============================================================================

/// `GET /api/spotify/artist?id=`
pub async fn spotify_artist(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<SpotifyArtistDetail>> {
    let spotify = state
        .spotify
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable(SPOTIFY_DISABLED.to_string()))?;

    let id = query.id.as_deref().unwrap_or_default().trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("id is required".to_string()));
    }

    let timeout = state.config.secondary_timeout;
    let outcome = tokio::time::timeout(timeout, spotify.get_artist(id))
        .await
        .unwrap_or_else(|_| Err(SpotifyError::Upstream(format!("lookup timed out after {timeout:?}"))));

    match outcome {
        Ok(artist) => Ok(Json(artist.into())),
        Err(err) => {
            log_warning(format!("Spotify artist lookup failed: {err}"));
            Err(ApiError::NotFound(format!("spotify artist {id} not found")))
        }
    }
}

// =============================================================================
// Operations
// =============================================================================

/// `POST /api/refresh`
pub async fn refresh(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let artists = state.refresher.refresh().await?;

    Ok(Json(RefreshResponse {
        status: "ok",
        artists,
        fetched_at: state.cache().fetched_at(),
    }))
}

/// `GET /health`, `GET /healthz`
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "gigscope",
        version: env!("CARGO_PKG_VERSION"),
    })
}
