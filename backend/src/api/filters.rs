//! Request filters applied to cache snapshots.
//!
//! Text filters are trimmed, lower-cased substring matches; an empty text
//! filter matches everything. Year filters only apply when positive.

use std::collections::HashMap;

use chrono::Datelike;

use super::types::{ArtistsQuery, EventsQuery, LocationView, LocationsQuery};
use crate::models::{ArtistWithMeta, DataBundle, DatesIndex, Event, Relation};
use crate::parser::{parse_date, split_slug};

/// Lower-cased, trimmed text filter.
pub fn text_filter(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_lowercase()
}

/// Positive integer filter; anything else (missing, garbage, zero or
/// negative) means "no filter" and yields 0.
pub fn positive_filter(value: Option<&str>) -> i64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(0)
}

fn contains(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

// =============================================================================
// Artists
// =============================================================================

/// Name, creation year and member filter for `/api/artists`.
#[derive(Debug, Clone, Default)]
pub struct ArtistFilter {
    pub name: String,
    pub year: i64,
    pub member: String,
}

impl ArtistFilter {
    pub fn from_query(query: &ArtistsQuery) -> Self {
        Self {
            name: text_filter(query.name.as_deref()),
            year: positive_filter(query.year.as_deref()),
            member: text_filter(query.member.as_deref()),
        }
    }

    pub fn matches(&self, artist: &ArtistWithMeta) -> bool {
        let base = &artist.artist;
        contains(&base.name, &self.name)
            && (self.year == 0 || i64::from(base.creation_date) == self.year)
            && (self.member.is_empty() || base.members.iter().any(|m| contains(m, &self.member)))
    }
}

/// Which providers `/api/artists` draws from, and in which shape it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSelection {
    pub primary: bool,
    pub secondary: bool,
    /// Answer with unified records instead of the plain artist list.
    pub unified: bool,
}

impl SourceSelection {
    pub fn from_query(query: &ArtistsQuery) -> Self {
        let source = text_filter(query.source.as_deref());
        let external = text_filter(query.external.as_deref());

        let secondary = source == "spotify" || source == "all" || external == "spotify";
        let primary = source.is_empty() || source == "groupie" || source == "all";

        Self {
            primary,
            secondary,
            unified: secondary || source == "groupie",
        }
    }
}

/// Secondary search size: `limit` when positive, else 8.
pub fn secondary_limit(query: &ArtistsQuery) -> i64 {
    match positive_filter(query.limit.as_deref()) {
        0 => crate::spotify::DEFAULT_SEARCH_LIMIT,
        limit => limit,
    }
}

// =============================================================================
// Events
// =============================================================================

/// Country, city, artist and year filter for `/api/events`.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub country: String,
    pub city: String,
    pub artist: String,
    pub year: i64,
}

impl EventFilter {
    pub fn from_query(query: &EventsQuery) -> Self {
        Self {
            country: text_filter(query.country.as_deref()),
            city: text_filter(query.city.as_deref()),
            artist: text_filter(query.artist.as_deref()),
            year: positive_filter(query.year.as_deref()),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        contains(&event.country, &self.country)
            && contains(&event.city, &self.city)
            && contains(&event.artist_name, &self.artist)
            && (self.year == 0 || i64::from(event.date.year()) == self.year)
    }
}

// =============================================================================
// Locations
// =============================================================================

/// Every (artist, slug) pair of the location index, with readable names and
/// the number of dates the relation lists for that slug.
pub fn location_views(bundle: &DataBundle) -> Vec<LocationView> {
    let names: HashMap<i64, &str> = bundle
        .artists
        .iter()
        .map(|artist| (artist.id, artist.name.as_str()))
        .collect();

    let relations: HashMap<i64, &Relation> = bundle
        .relations
        .iter()
        .map(|relation| (relation.id, relation))
        .collect();

    bundle
        .locations
        .iter()
        .flat_map(|entry| {
            let artist_name = names.get(&entry.id).copied().unwrap_or_default();
            let relation = relations.get(&entry.id).copied();

            entry.locations.iter().map(move |slug| {
                let name = split_slug(slug);
                LocationView {
                    artist_id: entry.id,
                    artist_name: artist_name.to_string(),
                    city: name.city,
                    country: name.country,
                    raw: name.raw,
                    event_count: relation
                        .and_then(|r| r.dates_locations.get(slug))
                        .map_or(0, Vec::len),
                }
            })
        })
        .collect()
}

/// Country, city and artist filter for `/api/locations`.
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    pub country: String,
    pub city: String,
    pub artist: String,
}

impl LocationFilter {
    pub fn from_query(query: &LocationsQuery) -> Self {
        Self {
            country: text_filter(query.country.as_deref()),
            city: text_filter(query.city.as_deref()),
            artist: text_filter(query.artist.as_deref()),
        }
    }

    pub fn matches(&self, view: &LocationView) -> bool {
        contains(&view.country, &self.country)
            && contains(&view.city, &self.city)
            && contains(&view.artist_name, &self.artist)
    }
}

// =============================================================================
// Dates
// =============================================================================

/// Keep only the raw dates falling in `year`; drop entries left empty.
///
/// `year == 0` returns the entries unchanged. Unparseable dates never match.
pub fn dates_in_year(entries: Vec<DatesIndex>, year: i64) -> Vec<DatesIndex> {
    if year == 0 {
        return entries;
    }

    entries
        .into_iter()
        .filter_map(|entry| {
            let dates: Vec<String> = entry
                .dates
                .into_iter()
                .filter(|raw| parse_date(raw).is_ok_and(|d| i64::from(d.year()) == year))
                .collect();
            (!dates.is_empty()).then_some(DatesIndex { id: entry.id, dates })
        })
        .collect()
}
