//! In-process fake upstream for tests.

use std::collections::HashMap;

use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub(crate) async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Two artists, two location entries, two date entries, two relations.
///
/// `/artists` is served as a bare array, the other three wrapped in `index`.
pub(crate) fn fixture_router() -> Router {
    fixture_with(Vec::new())
}

/// The fixture upstream with some of its four routes replaced.
pub(crate) fn fixture_with(overrides: Vec<(&'static str, MethodRouter)>) -> Router {
    let mut overrides: HashMap<&str, MethodRouter> = overrides.into_iter().collect();
    let defaults: [(&str, MethodRouter); 4] = [
        ("/artists", get(|| async { Json(fixture_artists()) })),
        ("/locations", get(|| async { Json(fixture_locations()) })),
        ("/dates", get(|| async { Json(fixture_dates()) })),
        ("/relation", get(|| async { Json(fixture_relations()) })),
    ];

    defaults
        .into_iter()
        .fold(Router::new(), |router, (path, default)| {
            router.route(path, overrides.remove(path).unwrap_or(default))
        })
}

pub(crate) fn fixture_artists() -> Value {
    json!([
        {
            "id": 1,
            "image": "https://img/queen.jpeg",
            "name": "Queen",
            "members": ["Freddie Mercury", "Brian May"],
            "creationDate": 1970,
            "firstAlbum": "14-12-1973",
            "locations": "https://api/locations/1",
            "concertDates": "https://api/dates/1",
            "relations": "https://api/relation/1"
        },
        {
            "id": 2,
            "image": "https://img/soja.jpeg",
            "name": "SOJA",
            "members": ["Jacob Hemphill"],
            "creationDate": 1997,
            "firstAlbum": "05-06-2002",
            "locations": "https://api/locations/2",
            "concertDates": "https://api/dates/2",
            "relations": "https://api/relation/2"
        }
    ])
}

fn fixture_locations() -> Value {
    json!({ "index": [
        { "id": 1, "locations": ["london-uk", "los_angeles-usa"], "dates": "https://api/dates/1" },
        { "id": 2, "locations": ["playa_del_carmen-mexico"], "dates": "https://api/dates/2" }
    ]})
}

fn fixture_dates() -> Value {
    json!({ "index": [
        { "id": 1, "dates": ["*23-08-2019", "20-08-2019"] },
        { "id": 2, "dates": ["*05-12-2019"] }
    ]})
}

pub(crate) fn fixture_relations() -> Value {
    json!({ "index": [
        { "id": 1, "datesLocations": {
            "london-uk": ["23-08-2019"],
            "los_angeles-usa": ["20-08-2019"]
        }},
        { "id": 2, "datesLocations": {
            "playa_del_carmen-mexico": ["05-12-2019"]
        }}
    ]})
}
