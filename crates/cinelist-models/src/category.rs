use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side movie collection selector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NowPlaying,
    Upcoming,
    Popular,
}

impl Category {
    /// Display order; the first entry is the default selection
    pub const ALL: [Category; 3] = [Category::NowPlaying, Category::Upcoming, Category::Popular];

    pub fn id(&self) -> u32 {
        match self {
            Category::NowPlaying => 1,
            Category::Upcoming => 2,
            Category::Popular => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::NowPlaying => "Now Playing",
            Category::Upcoming => "Upcoming",
            Category::Popular => "Popular",
        }
    }

    /// Value used in API paths (`/movie/{value}`)
    pub fn value(&self) -> &'static str {
        match self {
            Category::NowPlaying => "now_playing",
            Category::Upcoming => "upcoming",
            Category::Popular => "popular",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|c| c.value() == normalized)
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::ALL[0]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Server-side ordering applied to a category's results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortFilter {
    Alphabetical,
    Rating,
    ReleaseDate,
}

impl SortFilter {
    pub const ALL: [SortFilter; 3] = [SortFilter::Alphabetical, SortFilter::Rating, SortFilter::ReleaseDate];

    pub fn id(&self) -> u32 {
        match self {
            SortFilter::Alphabetical => 1,
            SortFilter::Rating => 2,
            SortFilter::ReleaseDate => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortFilter::Alphabetical => "By alphabetical order",
            SortFilter::Rating => "By rating",
            SortFilter::ReleaseDate => "By release date",
        }
    }

    /// Upstream `sort_by` parameter
    pub fn value(&self) -> &'static str {
        match self {
            SortFilter::Alphabetical => "original_title.desc",
            SortFilter::Rating => "vote_count.asc",
            SortFilter::ReleaseDate => "primary_release_date.asc",
        }
    }

    /// Accepts either the short name (`rating`, `release-date`) or the upstream value
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "alphabetical" | "az" | "title" => Some(SortFilter::Alphabetical),
            "rating" => Some(SortFilter::Rating),
            "release_date" => Some(SortFilter::ReleaseDate),
            other => Self::ALL.into_iter().find(|s| s.value() == other),
        }
    }
}

impl Default for SortFilter {
    fn default() -> Self {
        Self::ALL[0]
    }
}

impl fmt::Display for SortFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_first_entries() {
        assert_eq!(Category::default(), Category::NowPlaying);
        assert_eq!(SortFilter::default(), SortFilter::Alphabetical);
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(Category::from_value("popular"), Some(Category::Popular));
        assert_eq!(Category::from_value("now-playing"), Some(Category::NowPlaying));
        assert_eq!(Category::from_value("top_rated"), None);
    }

    #[test]
    fn test_sort_filter_lookup() {
        assert_eq!(SortFilter::from_name("rating"), Some(SortFilter::Rating));
        assert_eq!(SortFilter::from_name("release-date"), Some(SortFilter::ReleaseDate));
        assert_eq!(SortFilter::from_name("original_title.desc"), Some(SortFilter::Alphabetical));
        assert_eq!(SortFilter::from_name("random"), None);
    }

    #[test]
    fn test_serialized_as_api_value() {
        assert_eq!(serde_json::to_string(&Category::NowPlaying).unwrap(), "\"now_playing\"");
        assert_eq!(serde_json::to_string(&SortFilter::ReleaseDate).unwrap(), "\"release_date\"");
    }
}
