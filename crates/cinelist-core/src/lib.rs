pub mod feed;
pub mod preferences;
pub mod query_cache;
pub mod storage;
pub mod summary;
pub mod watchlist;

pub use feed::{FeedFetcher, FeedKey, FeedOptions, FeedSnapshot};
pub use preferences::{PreferenceEvent, PreferenceState, PreferenceStore, PREFERENCES_KEY};
pub use query_cache::{FetchPolicy, QueryCache};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use summary::{MovieSummary, ScoreBand, UserScore};
pub use watchlist::{sort_entries, SortOrder, WatchlistEvent, WatchlistSortKey, WatchlistStore, WATCHLIST_KEY};
