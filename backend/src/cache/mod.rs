//! In-memory store for the latest upstream bundle.
//!
//! [`DataCache`] holds at most one [`DataBundle`] plus the time it was
//! fetched. Readers get deep copies; a write swaps the whole bundle, so a
//! reader always sees one complete fetch cycle.
//!
//! When the cache gets (re)filled is decided by [`Refresher`]: once at
//! startup or on the first request, then only on an explicit refresh.

pub mod refresh;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::models::{ArtistWithMeta, DataBundle, Event};
use crate::transform::{build_events, merge_artists};

pub use refresh::Refresher;

/// A stored bundle and when it was fetched.
#[derive(Debug)]
struct Entry {
    bundle: Arc<DataBundle>,
    fetched_at: DateTime<Utc>,
}

/// Latest upstream bundle, shared between requests.
#[derive(Debug, Default)]
pub struct DataCache {
    entry: RwLock<Option<Entry>>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored bundle and stamp the current time.
    ///
    /// Unconditional, last writer wins.
    pub fn set(&self, bundle: DataBundle) {
        let entry = Entry {
            bundle: Arc::new(bundle),
            fetched_at: Utc::now(),
        };
        *self.write() = Some(entry);
    }

    /// Independent copy of the stored bundle, or `None` if never populated.
    pub fn snapshot(&self) -> Option<DataBundle> {
        // Clone the Arc under the lock, deep-copy outside it.
        let bundle = self.read().as_ref().map(|entry| Arc::clone(&entry.bundle))?;
        Some(DataBundle::clone(&bundle))
    }

    /// Artists joined with their metadata, from a fresh snapshot.
    pub fn artists_with_meta(&self) -> Option<Vec<ArtistWithMeta>> {
        self.snapshot().map(merge_artists)
    }

    /// Chronological events, from a fresh snapshot.
    pub fn events(&self) -> Option<Vec<Event>> {
        self.snapshot()
            .map(|bundle| build_events(&bundle.artists, &bundle.relations))
    }

    /// Time of the last successful [`set`](Self::set).
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.read().as_ref().map(|entry| entry.fetched_at)
    }

    /// Never populated.
    pub fn is_empty(&self) -> bool {
        self.read().is_none()
    }

    // A panicking writer can only poison the lock after the swap or before
    // it, so the guarded value is always a complete entry.
    fn read(&self) -> RwLockReadGuard<'_, Option<Entry>> {
        self.entry.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Entry>> {
        self.entry.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Artist, Relation};

    fn bundle(names: &[&str]) -> DataBundle {
        DataBundle {
            artists: names
                .iter()
                .enumerate()
                .map(|(i, name)| Artist {
                    id: i as i64 + 1,
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_cache() {
        let cache = DataCache::new();
        assert!(cache.is_empty());
        assert!(cache.snapshot().is_none());
        assert!(cache.fetched_at().is_none());
        assert!(cache.artists_with_meta().is_none());
        assert!(cache.events().is_none());
    }

    #[test]
    fn test_set_replaces_whole_bundle() {
        let cache = DataCache::new();
        cache.set(bundle(&["Queen", "ABBA"]));
        let first = cache.fetched_at().unwrap();

        cache.set(bundle(&["Muse"]));

        let snap = cache.snapshot().unwrap();
        assert_eq!(snap.artists.len(), 1);
        assert_eq!(snap.artists[0].name, "Muse");
        assert!(cache.fetched_at().unwrap() >= first);
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_populated_with_nothing_is_not_empty() {
        let cache = DataCache::new();
        cache.set(DataBundle::default());
        assert!(!cache.is_empty());
        assert_eq!(cache.artists_with_meta().unwrap().len(), 0);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let cache = DataCache::new();
        cache.set(bundle(&["Queen"]));

        let mut snap = cache.snapshot().unwrap();
        snap.artists[0].name = "Mutated".into();
        snap.artists.push(Artist::default());

        let again = cache.snapshot().unwrap();
        assert_eq!(again.artists.len(), 1);
        assert_eq!(again.artists[0].name, "Queen");
    }

    #[test]
    fn test_derived_views() {
        let cache = DataCache::new();
        let mut data = bundle(&["Queen"]);
        data.relations.push(Relation {
            id: 1,
            dates_locations: [("london-uk".to_string(), vec!["23-08-2019".to_string()])]
                .into_iter()
                .collect(),
        });
        cache.set(data);

        let artists = cache.artists_with_meta().unwrap();
        assert_eq!(artists[0].dates_locations.len(), 1);

        let events = cache.events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].artist_name, "Queen");
        assert_eq!(events[0].city, "London");
    }

    #[test]
    fn test_concurrent_readers_see_complete_bundles() {
        let cache = Arc::new(DataCache::new());
        cache.set(bundle(&["A", "B"]));

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    cache.set(bundle(&["C", "D", "E"]));
                    cache.set(bundle(&["A", "B"]));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let names: Vec<String> = cache
                            .snapshot()
                            .unwrap()
                            .artists
                            .into_iter()
                            .map(|a| a.name)
                            .collect();
                        assert!(names == ["A", "B"] || names == ["C", "D", "E"]);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
