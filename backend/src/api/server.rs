//! HTTP server for the Gigscope aggregator.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                          |
//! |--------|------------------------|--------------------------------------|
//! | GET    | `/api/artists`, `/api/artists/` | Artists, plain or unified |
//! | GET    | `/api/artists/{id}`    | One artist with its joined data      |
//! | GET    | `/api/locations`       | Location views                       |
//! | GET    | `/api/dates`           | Date indexes                         |
//! | GET    | `/api/relation`        | Relations                            |
//! | GET    | `/api/events`          | Flattened, dated concerts            |
//! | GET    | `/api/spotify/artist`  | Spotify artist detail                |
//! | POST   | `/api/refresh`         | Refill the cache from upstream       |
//! | GET    | `/api/logs`            | SSE stream for real-time logs        |
//! | GET    | `/health`, `/healthz`  | Health check                         |
//!
//! HTML pages, static assets and the favicon are served next to the API.

use std::path::{Path, PathBuf};

use axum::{
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Level;

use super::handlers;
use super::logs::sse_logs;
use super::pages;
use super::state::AppState;
use crate::config::Config;
use crate::error::ServerError;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        // JSON API
        .route("/api/artists", get(handlers::list_artists))
        .route("/api/artists/", get(handlers::list_artists))
        .route("/api/artists/{id}", get(handlers::get_artist))
        .route("/api/locations", get(handlers::list_locations))
        .route("/api/dates", get(handlers::list_dates))
        .route("/api/relation", get(handlers::list_relations))
        .route("/api/events", get(handlers::list_events))
        .route("/api/spotify/artist", get(handlers::spotify_artist))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/logs", get(sse_logs))
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check))
        // Pages
        .route("/", get(pages::index_page))
        .route("/index.html", get(pages::index_page))
        .route("/artist", get(pages::artist_page))
        .route("/artist.html", get(pages::artist_page))
        .route("/artist-spotify", get(pages::spotify_artist_page))
        .route("/artist-spotify.html", get(pages::spotify_artist_page))
        .route("/dates", get(pages::dates_page))
        .route("/dates.html", get(pages::dates_page))
        .route("/locations", get(pages::locations_page))
        .route("/locations.html", get(pages::locations_page))
        .route("/relations", get(pages::relations_page))
        .route("/relations.html", get(pages::relations_page))
        .route("/404", get(pages::not_found_page))
        .route("/404.html", get(pages::not_found_page))
        .route("/500", get(pages::server_error_page))
        .route("/500.html", get(pages::server_error_page))
        // Assets
        .route("/favicon.ico", get(favicon))
        .nest_service("/static", ServeDir::new(&static_dir))
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .fallback(pages::not_found_page)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
///
/// Tries to fill the cache before accepting connections, but starts anyway
/// when upstream is unreachable.
pub async fn start_server(config: Config) -> Result<(), ServerError> {
    let state = AppState::new(config)?;
    let bind_addr = state.config.bind_addr.clone();

    // Failure is already logged; the first request retries.
    let _ = state.refresher.prefetch(state.config.prefetch_timeout).await;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "gigscope server listening");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// =============================================================================
// Favicon
// =============================================================================

/// Places a favicon is looked up, in order.
fn favicon_candidates(static_dir: &Path) -> [PathBuf; 3] {
    [
        PathBuf::from("favicon.ico"),
        static_dir.join("image").join("grouper_tracke.ico"),
        static_dir.join("image").join("favicon.ico"),
    ]
}

async fn favicon(State(state): State<AppState>) -> Response {
    for path in favicon_candidates(&state.config.static_dir) {
        if let Ok(bytes) = tokio::fs::read(&path).await {
            return ([(header::CONTENT_TYPE, "image/x-icon")], bytes).into_response();
        }
    }
    StatusCode::NOT_FOUND.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::SpotifyClient;
    use crate::test_support::{fixture_relations, fixture_router, fixture_with, spawn_server};
    use axum::body::{to_bytes, Body};
    use axum::extract::Query;
    use axum::response::Json;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn config_for(api_base: &str, static_dir: &Path) -> Config {
        Config {
            api_base: api_base.to_string(),
            static_dir: static_dir.to_path_buf(),
            fetch_timeout: Duration::from_secs(5),
            secondary_timeout: Duration::from_secs(5),
            ..Config::default()
        }
    }

    async fn app_with_upstream(upstream: Router) -> Router {
        let base = spawn_server(upstream).await;
        router(AppState::new(config_for(&base, Path::new("static"))).unwrap())
    }

    /// Spotify stand-in whose search returns one duplicate of a fixture
    /// artist and one new artist.
    async fn fake_spotify() -> SpotifyClient {
        let upstream = Router::new()
            .route(
                "/token",
                post(|| async {
                    Json(json!({ "access_token": "tok", "token_type": "Bearer", "expires_in": 3600 }))
                }),
            )
            .route(
                "/v1/search",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(params.get("limit").map(String::as_str), Some("3"));
                    Json(json!({ "artists": { "items": [
                        { "id": "sp-queen", "name": "queen", "popularity": 90,
                          "images": [{ "url": "https://img/sp-queen" }] },
                        { "id": "sp-qotsa", "name": "Queens of the Stone Age", "popularity": 75,
                          "genres": ["rock"], "images": [{ "url": "https://img/qotsa" }] }
                    ]}}))
                }),
            );
        let base = spawn_server(upstream).await;
        SpotifyClient::new("id", "secret", Duration::from_secs(5))
            .unwrap()
            .with_endpoints(&format!("{base}/token"), &format!("{base}/v1/"))
    }

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(app, Method::GET, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn get_html(app: &Router, uri: &str) -> (StatusCode, String) {
        let (status, body) = send(app, Method::GET, uri).await;
        (status, String::from_utf8(body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with_upstream(fixture_router()).await;
        for path in ["/health", "/healthz"] {
            let (status, body) = get_json(&app, path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            assert_eq!(body["service"], "gigscope");
        }
    }

    #[tokio::test]
    async fn test_artists_filters() {
        let app = app_with_upstream(fixture_router()).await;

        let (status, body) = get_json(&app, "/api/artists").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["name"], "Queen");
        assert_eq!(body[0]["locations"].as_array().unwrap().len(), 2);
        assert_eq!(body[0]["locationsURL"], "https://api/locations/1");

        let (_, body) = get_json(&app, "/api/artists?name=SOJ").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], 2);

        let (_, body) = get_json(&app, "/api/artists?year=1970").await;
        assert_eq!(body[0]["name"], "Queen");
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = get_json(&app, "/api/artists?member=brian").await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        // Unparseable year is ignored.
        let (_, body) = get_json(&app, "/api/artists?year=soon").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_artist_by_id() {
        let app = app_with_upstream(fixture_router()).await;

        let (status, body) = get_json(&app, "/api/artists/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "SOJA");

        let (status, body) = get_json(&app, "/api/artists/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);

        let (status, _) = get_json(&app, "/api/artists/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // No id: the filtered list, as on `/api/artists`.
        let (status, body) = get_json(&app, "/api/artists/?name=queen").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Queen");
    }

    #[tokio::test]
    async fn test_groupie_source_is_unified() {
        let app = app_with_upstream(fixture_router()).await;

        let (status, body) = get_json(&app, "/api/artists?source=groupie&name=queen").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "1");
        assert_eq!(body[0]["source"], "groupie");
    }

    #[tokio::test]
    async fn test_spotify_only_without_credentials_is_unavailable() {
        let app = app_with_upstream(fixture_router()).await;
        let (status, _) = get_json(&app, "/api/artists?source=spotify&name=queen").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = get_json(&app, "/api/spotify/artist?id=abc").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unified_search_merges_providers() {
        let base = spawn_server(fixture_router()).await;
        let state = AppState::new(config_for(&base, Path::new("static")))
            .unwrap()
            .with_spotify(fake_spotify().await);
        let app = router(state);

        let (status, body) = get_json(&app, "/api/artists?source=all&name=queen&limit=3").await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Queen", "Queens of the Stone Age"]);
        assert_eq!(body[0]["source"], "groupie");
        assert_eq!(body[1]["source"], "spotify");
        assert_eq!(body[1]["genres"], json!(["rock"]));
    }

    #[tokio::test]
    async fn test_events_sorted_and_filtered() {
        let app = app_with_upstream(fixture_router()).await;

        let (status, body) = get_json(&app, "/api/events").await;
        assert_eq!(status, StatusCode::OK);
        let dates: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["date"].as_str().unwrap())
            .collect();
        assert_eq!(dates, vec!["2019-08-20", "2019-08-23", "2019-12-05"]);

        let (_, body) = get_json(&app, "/api/events?country=mexico").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["artistName"], "SOJA");
    }

    #[tokio::test]
    async fn test_locations_dates_relations() {
        let app = app_with_upstream(fixture_router()).await;

        let (_, body) = get_json(&app, "/api/locations?city=los").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["country"], "Usa");

        let (_, body) = get_json(&app, "/api/dates?year=2019").await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = get_json(&app, "/api/relation?id=2").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], 2);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let app = router(AppState::new(config_for("http://127.0.0.1:9", Path::new("static"))).unwrap());

        let (status, body) = get_json(&app, "/api/artists").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], 502);

        let (status, _) = send(&app, Method::POST, "/api/refresh").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        // Pages still render, without data.
        let (status, html) = get_html(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("temporarily unavailable"));
    }

    #[tokio::test]
    async fn test_refresh() {
        let app = app_with_upstream(fixture_router()).await;

        let (status, body) = send(&app, Method::POST, "/api/refresh").await;
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["artists"], 2);
        assert!(body["fetchedAt"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_serving() {
        // `/relation` works once, then fails.
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let upstream = fixture_with(vec![(
            "/relation",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Json(fixture_relations()).into_response()
                    } else {
                        StatusCode::INTERNAL_SERVER_ERROR.into_response()
                    }
                }
            }),
        )]);
        let app = app_with_upstream(upstream).await;

        let (status, _) = get_json(&app, "/api/events").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::POST, "/api/refresh").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, body) = get_json(&app, "/api/events").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pages() {
        let app = app_with_upstream(fixture_router()).await;

        let (status, html) = get_html(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("2 artists"));
        assert!(html.contains("/artist?id=1"));

        let (status, html) = get_html(&app, "/artist?id=1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Freddie Mercury"));
        let la = html.find("Los Angeles").unwrap();
        let london = html.find("London").unwrap();
        assert!(la < london, "concerts are listed chronologically");

        for uri in ["/dates", "/locations.html", "/relations"] {
            let (status, html) = get_html(&app, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(html.contains("Playa Del Carmen"), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_missing_pages() {
        let app = app_with_upstream(fixture_router()).await;

        for uri in ["/artist?id=42", "/artist?id=x", "/artist", "/no/such/page", "/404"] {
            let (status, _) = get_html(&app, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }

        let (status, _) = get_html(&app, "/500.html").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = get_html(&app, "/artist-spotify?id=abc").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_static_assets_and_favicon() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::create_dir_all(dir.path().join("image")).unwrap();
        std::fs::write(dir.path().join("css").join("style.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();

        let base = spawn_server(fixture_router()).await;
        let app = router(AppState::new(config_for(&base, dir.path())).unwrap());

        let (status, body) = send(&app, Method::GET, "/css/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"body{}");

        let (status, _) = send(&app, Method::GET, "/static/robots.txt").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, "/favicon.ico").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        std::fs::write(dir.path().join("image").join("favicon.ico"), [0u8, 0, 1, 0]).unwrap();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/favicon.ico").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/x-icon");
    }

    #[test]
    fn test_favicon_candidate_order() {
        let candidates = favicon_candidates(Path::new("assets"));
        assert_eq!(candidates[0], PathBuf::from("favicon.ico"));
        assert_eq!(candidates[1], Path::new("assets/image/grouper_tracke.ico"));
        assert_eq!(candidates[2], Path::new("assets/image/favicon.ico"));
    }
}
