//! Join the four raw collections into artist-centric and event-centric views.
//!
//! # Architecture
//!
//! ```text
//! DataBundle                           Derived views
//! ┌──────────────────┐                ┌──────────────────────────────┐
//! │ artists   [id]   │──┐             │ ArtistWithMeta (one per      │
//! │ locations [id]   │──┼─ by id ───▶ │   artist, in artist order)   │
//! │ dates     [id]   │──┤             ├──────────────────────────────┤
//! │ relations [id]   │──┴─ flatten ─▶ │ Event (one per parseable     │
//! └──────────────────┘                │   date, chronological)       │
//!                                     └──────────────────────────────┘
//! ```
//!
//! Both operations are total: missing lookups produce empty fields and
//! unparseable dates are dropped, nothing here returns an error.

use std::collections::HashMap;

use crate::models::{Artist, ArtistWithMeta, DataBundle, DatesLocations, Event, Relation};
use crate::parser::{parse_date, split_slug};

/// Join every artist with its location, dates and relation entries.
///
/// Lookup tables are built once, so the cost is linear in the size of the
/// bundle. Every input artist yields exactly one output record, in input
/// order.
pub fn merge_artists(bundle: DataBundle) -> Vec<ArtistWithMeta> {
    let DataBundle {
        artists,
        locations,
        dates,
        relations,
    } = bundle;

    let locations_by_id: HashMap<i64, Vec<String>> = locations
        .into_iter()
        .map(|entry| (entry.id, entry.locations))
        .collect();

    let dates_by_id: HashMap<i64, Vec<String>> = dates
        .into_iter()
        .map(|entry| (entry.id, entry.dates))
        .collect();

    let relations_by_id: HashMap<i64, DatesLocations> = relations
        .into_iter()
        .map(|entry| (entry.id, entry.dates_locations))
        .collect();

    artists
        .into_iter()
        .map(|artist| ArtistWithMeta {
            // Cloned, not moved: artists sharing an id all get the entry.
            location_list: lookup(&locations_by_id, artist.id),
            date_list: lookup(&dates_by_id, artist.id),
            dates_locations: lookup(&relations_by_id, artist.id),
            artist,
        })
        .collect()
}

/// Flatten relations into a chronological list of events.
///
/// Slugs become city/country, each raw date is parsed and dropped when it
/// doesn't parse. The sort is stable, so events on the same day keep the
/// order they were encountered in (relation order, then slug order).
pub fn build_events(artists: &[Artist], relations: &[Relation]) -> Vec<Event> {
    let names: HashMap<i64, &str> = artists
        .iter()
        .map(|artist| (artist.id, artist.name.as_str()))
        .collect();

    let mut events = Vec::with_capacity(relations.len() * 4);

    for relation in relations {
        let artist_name = names.get(&relation.id).copied().unwrap_or_default();

        for (slug, dates) in &relation.dates_locations {
            let location = split_slug(slug);

            for raw in dates {
                let Ok(date) = parse_date(raw) else {
                    continue;
                };
                events.push(Event {
                    artist_id: relation.id,
                    artist_name: artist_name.to_string(),
                    city: location.city.clone(),
                    country: location.country.clone(),
                    date,
                    date_iso: String::new(),
                });
            }
        }
    }

    events.sort_by_key(|event| event.date);

    for event in &mut events {
        event.date_iso = event.date.format("%Y-%m-%d").to_string();
    }

    events
}

fn lookup<V: Clone + Default>(table: &HashMap<i64, V>, id: i64) -> V {
    table.get(&id).cloned().unwrap_or_default()
}
