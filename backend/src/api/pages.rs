//! Server-rendered HTML pages.
//!
//! Pages never fail because upstream is down: they render whatever the
//! cache holds (possibly nothing) with a notice instead of answering 502
//! like the JSON endpoints do.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use super::filters::{location_views, positive_filter};
use super::logs::log_warning;
use super::state::AppState;
use super::types::{IdQuery, SpotifyArtistDetail};
use crate::models::{DataBundle, Event};
use crate::parser::split_slug;
use crate::transform::{build_events, merge_artists};

/// Inline CSS shared by every page.
const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#f6f5f2;--fg:#1b1b1b;--fg2:#555;--fg3:#999;--accent:#d9480f;--border:rgba(0,0,0,.08)}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.55;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;flex-direction:column}
header{display:flex;gap:1.25rem;align-items:center;padding:1rem 2rem;border-bottom:1px solid var(--border)}
header .brand{font-weight:800;font-size:1.2rem;color:var(--fg)}
header a{color:var(--fg2);text-decoration:none}
header a:hover{color:var(--accent)}
main{flex:1;width:100%;max-width:1080px;margin:0 auto;padding:1.5rem 1rem}
h1{font-size:1.8rem;letter-spacing:-.02em;margin-bottom:.5rem}
.meta{color:var(--fg3);font-size:.9rem;margin-bottom:1.25rem}
.notice{padding:.75rem 1rem;border:1px solid var(--accent);border-radius:8px;margin-bottom:1rem;color:var(--accent)}
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(180px,1fr));gap:1rem}
.card{display:block;border-radius:10px;overflow:hidden;background:#fff;border:1px solid var(--border);color:var(--fg);text-decoration:none}
.card img{width:100%;aspect-ratio:1;object-fit:cover;display:block}
.card span{display:block;padding:.6rem .75rem;font-weight:600}
.detail{display:flex;gap:1.5rem;flex-wrap:wrap}
.detail img{width:260px;max-width:100%;border-radius:10px}
table{width:100%;border-collapse:collapse;background:#fff}
th,td{text-align:left;padding:.45rem .6rem;border-bottom:1px solid var(--border)}
th{font-size:.8rem;text-transform:uppercase;color:var(--fg3)}
ul.plain{list-style:none}
footer{padding:1rem 2rem;color:var(--fg3);font-size:.8rem;text-align:center}
"#;

// =============================================================================
// Layout
// =============================================================================

fn layout(title: &str, notice: Option<&str>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Gigscope" }
                link rel="icon" href="/favicon.ico";
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                header {
                    a class="brand" href="/" { "Gigscope" }
                    a href="/" { "Artists" }
                    a href="/dates" { "Dates" }
                    a href="/locations" { "Locations" }
                    a href="/relations" { "Relations" }
                }
                main {
                    @if let Some(notice) = notice {
                        p class="notice" { (notice) }
                    }
                    (body)
                }
                footer { "Concert data from the Groupie Tracker API" }
            }
        }
    }
}

fn status_page(status: StatusCode, title: &str, message: &str) -> Response {
    let markup = layout(
        title,
        None,
        html! {
            h1 { (status.as_u16()) " · " (title) }
            p { (message) }
            p { a href="/" { "Back to the artist list" } }
        },
    );
    (status, markup).into_response()
}

fn not_found() -> Response {
    status_page(
        StatusCode::NOT_FOUND,
        "Not Found",
        "The page or artist you are looking for does not exist.",
    )
}

/// Cache contents for a page, with a notice when upstream could not be reached.
async fn page_data(state: &AppState) -> (DataBundle, Option<String>) {
    match state.refresher.ensure_populated().await {
        Ok(()) => (state.cache().snapshot().unwrap_or_default(), None),
        Err(err) => {
            log_warning(format!("Rendering page without data: {err}"));
            (
                DataBundle::default(),
                Some("Concert data is temporarily unavailable. Please try again later.".to_string()),
            )
        }
    }
}

fn artist_names(bundle: &DataBundle) -> HashMap<i64, &str> {
    bundle
        .artists
        .iter()
        .map(|artist| (artist.id, artist.name.as_str()))
        .collect()
}

fn events_table(events: &[Event], with_artist: bool) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { "Date" }
                    @if with_artist { th { "Artist" } }
                    th { "City" }
                    th { "Country" }
                }
            }
            tbody {
                @for event in events {
                    tr {
                        td { (event.date_iso) }
                        @if with_artist {
                            td { a href={ "/artist?id=" (event.artist_id) } { (event.artist_name) } }
                        }
                        td { (event.city) }
                        td { (event.country) }
                    }
                }
            }
        }
    }
}

// =============================================================================
// Pages
// =============================================================================

/// `GET /`: artist grid.
pub async fn index_page(State(state): State<AppState>) -> Response {
    let (bundle, notice) = page_data(&state).await;
    let updated = state
        .cache()
        .fetched_at()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "never".to_string());
    let artists = merge_artists(bundle);

    layout(
        "Artists",
        notice.as_deref(),
        html! {
            h1 { "Artists" }
            p class="meta" { (artists.len()) " artists · last updated " (updated) }
            div class="grid" {
                @for meta in &artists {
                    a class="card" href={ "/artist?id=" (meta.artist.id) } {
                        img src=(meta.artist.image) alt=(meta.artist.name) loading="lazy";
                        span { (meta.artist.name) }
                    }
                }
            }
        },
    )
    .into_response()
}

/// `GET /artist?id=`: one artist with members and concerts.
pub async fn artist_page(State(state): State<AppState>, Query(query): Query<IdQuery>) -> Response {
    let id = positive_filter(query.id.as_deref());
    if id == 0 {
        return not_found();
    }

    let (bundle, notice) = page_data(&state).await;
    let events: Vec<Event> = build_events(&bundle.artists, &bundle.relations)
        .into_iter()
        .filter(|event| event.artist_id == id)
        .collect();

    let Some(meta) = merge_artists(bundle).into_iter().find(|m| m.artist.id == id) else {
        return not_found();
    };
    let artist = &meta.artist;

    layout(
        &artist.name,
        notice.as_deref(),
        html! {
            div class="detail" {
                img src=(artist.image) alt=(artist.name);
                div {
                    h1 { (artist.name) }
                    p class="meta" {
                        "Formed " (artist.creation_date) " · first album " (artist.first_album)
                    }
                    h2 { "Members" }
                    ul class="plain" {
                        @for member in &artist.members {
                            li { (member) }
                        }
                    }
                }
            }
            h2 { "Concerts" }
            @if events.is_empty() {
                p class="meta" { "No known concerts." }
            } @else {
                (events_table(&events, false))
            }
        },
    )
    .into_response()
}

/// `GET /artist-spotify?id=`: Spotify artist detail.
pub async fn spotify_artist_page(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Response {
    let Some(spotify) = state.spotify.as_ref() else {
        return status_page(
            StatusCode::SERVICE_UNAVAILABLE,
            "Unavailable",
            "Spotify integration is not configured on this server.",
        );
    };

    let id = query.id.as_deref().unwrap_or_default().trim();
    if id.is_empty() {
        return not_found();
    }

    let lookup = tokio::time::timeout(state.config.secondary_timeout, spotify.get_artist(id)).await;
    let artist = match lookup {
        Ok(Ok(artist)) => SpotifyArtistDetail::from(artist),
        Ok(Err(err)) => {
            log_warning(format!("Spotify artist lookup failed: {err}"));
            return not_found();
        }
        Err(_) => {
            log_warning(format!("Spotify artist lookup for {id} timed out"));
            return not_found();
        }
    };

    layout(
        &artist.name,
        None,
        html! {
            div class="detail" {
                img src=(artist.image_url) alt=(artist.name);
                div {
                    h1 { (artist.name) }
                    p class="meta" {
                        (artist.followers) " followers · popularity " (artist.popularity)
                    }
                    @if !artist.genres.is_empty() {
                        h2 { "Genres" }
                        ul class="plain" {
                            @for genre in &artist.genres {
                                li { (genre) }
                            }
                        }
                    }
                }
            }
        },
    )
    .into_response()
}

/// `GET /dates`: every concert, chronologically.
pub async fn dates_page(State(state): State<AppState>) -> Response {
    let (bundle, notice) = page_data(&state).await;
    let events = build_events(&bundle.artists, &bundle.relations);

    layout(
        "Dates",
        notice.as_deref(),
        html! {
            h1 { "Concert dates" }
            p class="meta" { (events.len()) " concerts" }
            (events_table(&events, true))
        },
    )
    .into_response()
}

/// `GET /locations`: every location an artist played.
pub async fn locations_page(State(state): State<AppState>) -> Response {
    let (bundle, notice) = page_data(&state).await;
    let views = location_views(&bundle);

    layout(
        "Locations",
        notice.as_deref(),
        html! {
            h1 { "Locations" }
            table {
                thead {
                    tr { th { "Artist" } th { "City" } th { "Country" } th { "Concerts" } }
                }
                tbody {
                    @for view in &views {
                        tr {
                            td { a href={ "/artist?id=" (view.artist_id) } { (view.artist_name) } }
                            td { (view.city) }
                            td { (view.country) }
                            td { (view.event_count) }
                        }
                    }
                }
            }
        },
    )
    .into_response()
}

/// `GET /relations`: each artist's location → dates map.
pub async fn relations_page(State(state): State<AppState>) -> Response {
    let (bundle, notice) = page_data(&state).await;
    let names = artist_names(&bundle);

    layout(
        "Relations",
        notice.as_deref(),
        html! {
            h1 { "Relations" }
            @for relation in &bundle.relations {
                section {
                    h2 {
                        a href={ "/artist?id=" (relation.id) } {
                            (names.get(&relation.id).copied().unwrap_or("Unknown artist"))
                        }
                    }
                    ul class="plain" {
                        @for (slug, dates) in &relation.dates_locations {
                            @let place = split_slug(slug);
                            li { strong { (place.city) ", " (place.country) } " · " (dates.join(", ")) }
                        }
                    }
                }
            }
        },
    )
    .into_response()
}

/// `GET /404` and every unknown path.
pub async fn not_found_page() -> Response {
    not_found()
}

/// `GET /500`
pub async fn server_error_page() -> Response {
    status_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Server Error",
        "Something went wrong on our side. Please try again later.",
    )
}
