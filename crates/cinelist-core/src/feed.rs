use crate::query_cache::{FetchPolicy, QueryCache, DEFAULT_GC_TIME, DEFAULT_STALE_TIME};
use cinelist_api::{ApiError, MovieFeedSource, PaginationParams, DEFAULT_LANGUAGE};
use cinelist_models::{Category, Movie, MoviePage, SortFilter};
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Identifies one paginated feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub category: Category,
    pub sort: SortFilter,
}

impl FeedKey {
    pub fn new(category: Category, sort: SortFilter) -> Self {
        Self { category, sort }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PageKey {
    feed: FeedKey,
    page: u32,
}

#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub language: String,
    pub region: Option<String>,
    pub stale_time: Duration,
    pub gc_time: Duration,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            region: None,
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

/// Point-in-time view of the feed
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub key: Option<FeedKey>,
    pub movies: Vec<Movie>,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub has_next_page: bool,
    pub can_load_more: bool,
    pub error: Option<ApiError>,
    pub current_page: u32,
    pub pages_loaded: usize,
    pub total_pages: u32,
    pub total_results: u64,
}

#[derive(Debug, Default)]
struct FeedState {
    key: Option<FeedKey>,
    pages: Vec<MoviePage>,
    current_page: u32,
    is_loading: bool,
    is_loading_more: bool,
    error: Option<ApiError>,
    // Only the response to the most recently issued request is applied
    latest_token: u64,
}

impl FeedState {
    fn issue_token(&mut self) -> u64 {
        self.latest_token += 1;
        self.latest_token
    }

    fn reset_for(&mut self, key: FeedKey) -> u64 {
        self.key = Some(key);
        self.pages.clear();
        self.current_page = 0;
        self.is_loading = true;
        self.is_loading_more = false;
        self.error = None;
        self.issue_token()
    }

    fn has_next_page(&self) -> bool {
        self.pages.last().map(|page| page.has_next_page()).unwrap_or(false)
    }

    fn snapshot(&self) -> FeedSnapshot {
        let has_next_page = self.has_next_page();
        let last = self.pages.last();
        FeedSnapshot {
            key: self.key,
            movies: self.pages.iter().flat_map(|page| page.results.iter().cloned()).collect(),
            is_loading: self.is_loading,
            is_loading_more: self.is_loading_more,
            has_next_page,
            can_load_more: has_next_page && !self.is_loading_more,
            error: self.error.clone(),
            current_page: self.current_page,
            pages_loaded: self.pages.len(),
            total_pages: last.map(|page| page.total_pages).unwrap_or(0),
            total_results: last.map(|page| page.total_results).unwrap_or(0),
        }
    }
}

/// Accumulates the pages of one (category, sort) feed at a time.
///
/// Switching feeds resets the page list. Responses that arrive after a newer request was
/// issued, or for a feed that is no longer selected, are dropped. Pages are shared through
/// a [`QueryCache`] so revisiting a feed inside the freshness window costs no requests.
pub struct FeedFetcher {
    source: Arc<dyn MovieFeedSource>,
    options: FeedOptions,
    cache: QueryCache<PageKey, MoviePage, ApiError>,
    state: Mutex<FeedState>,
    snapshots: watch::Sender<FeedSnapshot>,
}

impl FeedFetcher {
    pub fn new(source: Arc<dyn MovieFeedSource>, options: FeedOptions) -> Self {
        let cache = QueryCache::new(options.stale_time, options.gc_time);
        let (snapshots, _) = watch::channel(FeedSnapshot::default());
        Self {
            source,
            options,
            cache,
            state: Mutex::new(FeedState::default()),
            snapshots,
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn movies(&self) -> Vec<Movie> {
        self.snapshot().movies
    }

    pub fn can_load_more(&self) -> bool {
        self.snapshot().can_load_more
    }

    /// Select a feed and load its first page
    pub async fn load(&self, category: Category, sort: SortFilter) -> Result<FeedSnapshot, ApiError> {
        let key = FeedKey::new(category, sort);
        let token = {
            let mut state = self.state();
            if state.key != Some(key) {
                info!("Loading {} sorted by {}", category, sort);
            }
            state.reset_for(key)
        };
        self.publish();
        self.run(key, 1, token, FetchPolicy::CacheFirst).await
    }

    /// Fetch the page after the last one loaded. A no-op while another request is
    /// outstanding or when the feed is exhausted.
    pub async fn load_more(&self) -> Result<FeedSnapshot, ApiError> {
        let (key, page, token) = {
            let mut state = self.state();
            let Some(key) = state.key else {
                debug!("load_more called before any feed was loaded");
                return Ok(state.snapshot());
            };
            if state.is_loading || state.is_loading_more {
                debug!("load_more ignored, request already in flight");
                return Ok(state.snapshot());
            }
            if !state.has_next_page() {
                debug!("load_more ignored, no further pages");
                return Ok(state.snapshot());
            }
            state.is_loading_more = true;
            (key, state.current_page + 1, state.issue_token())
        };
        self.publish();
        self.run(key, page, token, FetchPolicy::CacheFirst).await
    }

    /// Drop cached pages for the current feed and refetch page 1 from the source
    pub async fn refresh(&self) -> Result<FeedSnapshot, ApiError> {
        let (key, token) = {
            let mut state = self.state();
            let Some(key) = state.key else {
                return Ok(state.snapshot());
            };
            (key, state.reset_for(key))
        };
        self.cache.invalidate(|page_key| page_key.feed == key);
        info!("Refreshing {} sorted by {}", key.category, key.sort);
        self.publish();
        self.run(key, 1, token, FetchPolicy::NetworkOnly).await
    }

    /// Evict idle cached pages
    pub fn collect_garbage(&self) -> usize {
        self.cache.collect_garbage()
    }

    fn params_for(&self, key: FeedKey, page: u32) -> PaginationParams {
        PaginationParams::default()
            .page(page)
            .language(self.options.language.clone())
            .region(self.options.region.clone())
            .sort_by(Some(key.sort.value().to_string()))
    }

    async fn run(&self, key: FeedKey, page: u32, token: u64, policy: FetchPolicy) -> Result<FeedSnapshot, ApiError> {
        let source = Arc::clone(&self.source);
        let params = self.params_for(key, page);
        let page_key = PageKey { feed: key, page };

        let result = self
            .cache
            .fetch(page_key, policy, move || {
                async move { source.fetch_page(key.category, &params).await }.boxed()
            })
            .await;

        self.apply(key, page, token, &result);
        match result {
            Ok(_) => Ok(self.snapshot()),
            Err(e) => Err(e),
        }
    }

    fn apply(&self, key: FeedKey, requested: u32, token: u64, result: &Result<MoviePage, ApiError>) {
        {
            let mut state = self.state();
            if state.latest_token != token || state.key != Some(key) {
                debug!("Discarding superseded response for page {} of {:?}", requested, key);
                return;
            }

            match result {
                Ok(page) => {
                    if requested == 1 {
                        state.pages = vec![page.clone()];
                    } else {
                        state.pages.push(page.clone());
                    }
                    state.current_page = page.page;
                    state.error = None;
                    debug!(
                        "Applied page {}/{} ({} movies)",
                        page.page,
                        page.total_pages,
                        page.results.len()
                    );
                }
                Err(e) => {
                    warn!("Failed to load page {} of {:?}: {}", requested, key, e);
                    state.error = Some(e.clone());
                }
            }
            state.is_loading = false;
            state.is_loading_more = false;
        }
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshots.send_replace(snapshot);
    }
}
