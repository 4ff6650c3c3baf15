//! Domain models for the Gigscope aggregation service.
//!
//! Raw collections, decoded from the primary upstream API:
//!
//! - [`Artist`] - One band or performer
//! - [`LocationIndex`] - Location slugs an artist played
//! - [`DatesIndex`] - Raw concert dates of an artist
//! - [`Relation`] - Authoritative slug → dates join for an artist
//! - [`DataBundle`] - The four collections of one fetch cycle
//!
//! Derived views, rebuilt per request from a cache snapshot:
//!
//! - [`ArtistWithMeta`] - Artist joined with its locations, dates and relations
//! - [`Event`] - One (artist, location, date) concert
//! - [`LocationName`] - Human readable city/country of a slug
//! - [`UnifiedArtist`] - Provider-agnostic artist record

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Canonical slug → raw dates map.
pub type DatesLocations = BTreeMap<String, Vec<String>>;

// =============================================================================
// Raw Upstream Collections
// =============================================================================

/// An artist as returned by `/artists`.
///
/// Upstream names the three cross-reference URLs `locations`, `concertDates`
/// and `relations`; they are emitted as `locationsURL`, `datesURL` and
/// `relationsURL` so they never clash with the resolved lists of
/// [`ArtistWithMeta`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Artist {
    pub id: i64,
    pub image: String,
    pub name: String,
    pub members: Vec<String>,
    pub creation_date: i32,
    pub first_album: String,
    #[serde(rename(serialize = "locationsURL", deserialize = "locations"))]
    pub locations_url: String,
    #[serde(rename(serialize = "datesURL", deserialize = "concertDates"))]
    pub dates_url: String,
    #[serde(rename(serialize = "relationsURL", deserialize = "relations"))]
    pub relations_url: String,
}

/// One entry of `/locations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationIndex {
    pub id: i64,
    pub locations: Vec<String>,
    #[serde(rename = "dates")]
    pub dates_url: String,
}

/// One entry of `/dates`. Dates may carry a leading `*` (unconfirmed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatesIndex {
    pub id: i64,
    pub dates: Vec<String>,
}

/// One entry of `/relation`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Relation {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_dates_locations")]
    pub dates_locations: DatesLocations,
}

/// The four raw collections of a single fetch cycle.
///
/// Always built and replaced as a whole; readers never see collections
/// from different cycles side by side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBundle {
    pub artists: Vec<Artist>,
    pub locations: Vec<LocationIndex>,
    pub dates: Vec<DatesIndex>,
    pub relations: Vec<Relation>,
}

// =============================================================================
// datesLocations shape normalization
// =============================================================================

/// Every shape upstream has been seen sending for `datesLocations`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDatesLocations {
    /// `""` or a message string: no relations.
    Text(#[serde(deserialize_with = "any_string")] ()),
    /// The documented `{slug: [date, ...]}` form.
    Canonical(DatesLocations),
    /// `{slug: <array of anything> | <scalar>}`.
    Mixed(BTreeMap<String, Value>),
}

impl RawDatesLocations {
    fn normalize(self) -> DatesLocations {
        match self {
            Self::Text(_) => DatesLocations::new(),
            Self::Canonical(map) => map,
            Self::Mixed(map) => map
                .into_iter()
                .map(|(slug, value)| {
                    let dates = match value {
                        Value::Array(items) => items.iter().map(stringify).collect(),
                        Value::Null => Vec::new(),
                        scalar => vec![stringify(&scalar)],
                    };
                    (slug, dates)
                })
                .collect(),
        }
    }
}

/// Accepts any string and keeps nothing of it.
fn any_string<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(drop)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn deserialize_dates_locations<'de, D>(deserializer: D) -> Result<DatesLocations, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDatesLocations>::deserialize(deserializer)?;
    Ok(raw.map(RawDatesLocations::normalize).unwrap_or_default())
}

// =============================================================================
// Derived Views
// =============================================================================

/// An artist joined with everything the bundle knows about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistWithMeta {
    #[serde(flatten)]
    pub artist: Artist,
    #[serde(rename = "locations", skip_serializing_if = "Vec::is_empty")]
    pub location_list: Vec<String>,
    #[serde(rename = "dates", skip_serializing_if = "Vec::is_empty")]
    pub date_list: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dates_locations: DatesLocations,
}

/// Readable form of a location slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationName {
    pub city: String,
    pub country: String,
    pub raw: String,
}

/// A single concert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub artist_id: i64,
    /// Empty when the relation's id has no matching artist.
    pub artist_name: String,
    pub city: String,
    pub country: String,
    #[serde(skip)]
    pub date: NaiveDate,
    /// `YYYY-MM-DD`
    #[serde(rename = "date")]
    pub date_iso: String,
}

// =============================================================================
// Unified Artist
// =============================================================================

/// Which provider a [`UnifiedArtist`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtistSource {
    /// The concert-data API.
    #[serde(rename = "groupie")]
    Primary,
    /// The Spotify catalog.
    #[serde(rename = "spotify")]
    Secondary,
}

/// Harmonised artist shape returned by the combined search.
///
/// Primary-sourced records carry creation date, first album and members;
/// secondary-sourced ones carry genres and popularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedArtist {
    pub id: String,
    pub name: String,
    #[serde(rename = "image_url")]
    pub image_url: String,
    pub source: ArtistSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

// =============================================================================
// Tests
// =============================================================================
