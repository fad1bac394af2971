use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use crate::movie::{parse_release_date, Movie};

/// Reduced projection of a [`Movie`] saved to the local watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: String,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn from_movie(movie: &Movie, added_at: DateTime<Utc>) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            release_date: movie.release_date.clone(),
            vote_average: movie.vote_average,
            overview: movie.overview.clone(),
            added_at,
        }
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        parse_release_date(&self.release_date)
    }
}
