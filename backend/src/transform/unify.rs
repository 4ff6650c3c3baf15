//! Cross-provider unification of artist results.
//!
//! Both providers are mapped to [`UnifiedArtist`], then merged with a
//! deterministic, order-preserving de-duplication keyed by the lower-cased,
//! trimmed name. The primary provider always wins a collision; the losing
//! secondary record is dropped whole, no field-level merge.
//!
//! Name equality is an approximation of identity: two distinct artists with
//! the same name collapse into the primary one.

use std::collections::HashSet;

use crate::models::{ArtistSource, ArtistWithMeta, UnifiedArtist};
use crate::spotify::{pick_best_image, SpotifyArtist};

/// Map a primary-provider artist to the unified shape.
pub fn from_primary(artist: &ArtistWithMeta) -> UnifiedArtist {
    let base = &artist.artist;
    UnifiedArtist {
        id: base.id.to_string(),
        name: base.name.clone(),
        image_url: base.image.clone(),
        source: ArtistSource::Primary,
        creation_date: (base.creation_date != 0).then_some(base.creation_date),
        first_album: non_empty(&base.first_album),
        members: (!base.members.is_empty()).then(|| base.members.clone()),
        genres: None,
        popularity: None,
    }
}

/// Map a Spotify artist to the unified shape.
pub fn from_secondary(artist: &SpotifyArtist) -> UnifiedArtist {
    UnifiedArtist {
        id: artist.id.clone(),
        name: artist.name.clone(),
        image_url: pick_best_image(&artist.images),
        source: ArtistSource::Secondary,
        creation_date: None,
        first_album: None,
        members: None,
        genres: (!artist.genres.is_empty()).then(|| artist.genres.clone()),
        popularity: (artist.popularity != 0).then_some(artist.popularity),
    }
}

/// Merge primary and secondary results into one de-duplicated list.
///
/// Output order: primary entries in input order, then the secondary entries
/// whose name key was not seen yet, in input order. Entries with a blank
/// name are dropped from both sides.
pub fn merge_unified(primary: Vec<UnifiedArtist>, secondary: Vec<UnifiedArtist>) -> Vec<UnifiedArtist> {
    let mut merged = Vec::with_capacity(primary.len() + secondary.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(primary.len() + secondary.len());

    for artist in primary {
        let key = name_key(&artist.name);
        if key.is_empty() {
            continue;
        }
        seen.insert(key);
        merged.push(artist);
    }

    for artist in secondary {
        let key = name_key(&artist.name);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        merged.push(artist);
    }

    merged
}

/// De-duplication key: trimmed, lower-cased name.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
