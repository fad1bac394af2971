use crate::storage::{load_record, save_record, KeyValueStorage, StorageError};
use chrono::{NaiveDate, Utc};
use cinelist_models::{Movie, WatchlistEntry};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const WATCHLIST_KEY: &str = "watchlist-storage";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WatchlistRecord {
    #[serde(default)]
    movies: Vec<WatchlistEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistEvent {
    Added(u64),
    Removed(u64),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchlistSortKey {
    Title,
    #[default]
    Rating,
    ReleaseDate,
}

impl WatchlistSortKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "title" => Some(Self::Title),
            "rating" => Some(Self::Rating),
            "release_date" | "release-date" | "date" => Some(Self::ReleaseDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Locally saved movies, newest first, at most one entry per movie id
pub struct WatchlistStore {
    storage: Arc<dyn KeyValueStorage>,
    movies: Vec<WatchlistEntry>,
    events: broadcast::Sender<WatchlistEvent>,
}

impl WatchlistStore {
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let movies = match load_record::<WatchlistRecord>(storage.as_ref(), WATCHLIST_KEY) {
            Ok(Some(record)) => dedup_by_id(record.movies),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Ignoring unreadable watchlist: {}", e);
                Vec::new()
            }
        };
        debug!("Restored watchlist with {} entries", movies.len());
        let (events, _) = broadcast::channel(16);
        Self { storage, movies, events }
    }

    /// Add a movie at the head of the list. Returns false (and writes nothing) when the
    /// id is already present.
    pub fn add(&mut self, movie: &Movie) -> Result<bool, StorageError> {
        if self.contains(movie.id) {
            debug!("Movie {} already in watchlist", movie.id);
            return Ok(false);
        }
        self.movies.insert(0, WatchlistEntry::from_movie(movie, Utc::now()));
        info!("Added \"{}\" to watchlist", movie.title);
        self.emit(WatchlistEvent::Added(movie.id));
        self.persist()?;
        Ok(true)
    }

    /// Drop the entry with this id, if any. Returns whether something was removed.
    pub fn remove(&mut self, movie_id: u64) -> Result<bool, StorageError> {
        let before = self.movies.len();
        self.movies.retain(|entry| entry.id != movie_id);
        let removed = self.movies.len() != before;
        if removed {
            info!("Removed movie {} from watchlist", movie_id);
            self.emit(WatchlistEvent::Removed(movie_id));
        }
        self.persist()?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.movies.clear();
        info!("Cleared watchlist");
        self.emit(WatchlistEvent::Cleared);
        self.persist()
    }

    pub fn contains(&self, movie_id: u64) -> bool {
        self.movies.iter().any(|entry| entry.id == movie_id)
    }

    pub fn find_by_id(&self, movie_id: u64) -> Option<&WatchlistEntry> {
        self.movies.iter().find(|entry| entry.id == movie_id)
    }

    pub fn count(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.movies
    }

    pub fn sorted(&self, key: WatchlistSortKey, order: SortOrder) -> Vec<WatchlistEntry> {
        sort_entries(&self.movies, key, order)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WatchlistEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: WatchlistEvent) {
        let _ = self.events.send(event);
    }

    fn persist(&self) -> Result<(), StorageError> {
        let record = WatchlistRecord { movies: self.movies.clone() };
        save_record(self.storage.as_ref(), WATCHLIST_KEY, &record).map_err(|e| {
            warn!("Failed to persist watchlist: {}", e);
            e
        })
    }
}

fn dedup_by_id(movies: Vec<WatchlistEntry>) -> Vec<WatchlistEntry> {
    let mut seen = HashSet::new();
    let total = movies.len();
    let unique: Vec<WatchlistEntry> = movies.into_iter().filter(|entry| seen.insert(entry.id)).collect();
    if unique.len() != total {
        warn!("Dropped {} duplicate watchlist entries", total - unique.len());
    }
    unique
}

/// Stable sort of a copy of `entries`. Ties keep their input order in both directions.
pub fn sort_entries(entries: &[WatchlistEntry], key: WatchlistSortKey, order: SortOrder) -> Vec<WatchlistEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_entries(a, b, key);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
    sorted
}

fn compare_entries(a: &WatchlistEntry, b: &WatchlistEntry, key: WatchlistSortKey) -> Ordering {
    match key {
        WatchlistSortKey::Title => compare_titles(&a.title, &b.title),
        WatchlistSortKey::Rating => a.vote_average.total_cmp(&b.vote_average),
        WatchlistSortKey::ReleaseDate => date_or_epoch(a).cmp(&date_or_epoch(b)),
    }
}

/// Collation-style title comparison: base letters first, then accents, ignoring case
fn compare_titles(a: &str, b: &str) -> Ordering {
    title_sort_key(a)
        .cmp(&title_sort_key(b))
        .then_with(|| a.trim().to_lowercase().cmp(&b.trim().to_lowercase()))
}

/// `"Élan"` -> `"elan"`
fn title_sort_key(title: &str) -> String {
    title
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn date_or_epoch(entry: &WatchlistEntry) -> NaiveDate {
    entry
        .release_date()
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default())
}
