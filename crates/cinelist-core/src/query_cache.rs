use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Serve a fresh entry if there is one, otherwise join or start a request
    CacheFirst,
    /// Always start a new request
    NetworkOnly,
}

struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
    last_used: Instant,
}

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct InFlight<V, E> {
    id: u64,
    future: SharedFetch<V, E>,
}

struct CacheInner<K, V, E> {
    entries: HashMap<K, CacheEntry<V>>,
    in_flight: HashMap<K, InFlight<V, E>>,
    next_id: u64,
}

/// Keyed response cache with a freshness window, idle eviction and request coalescing.
///
/// Concurrent callers asking for the same key while a request is outstanding share that
/// request's result. Only successful results are cached.
pub struct QueryCache<K, V, E> {
    stale_time: Duration,
    gc_time: Duration,
    inner: Mutex<CacheInner<K, V, E>>,
}

impl<K, V, E> QueryCache<K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
    E: Clone,
{
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            stale_time,
            gc_time,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<K, V, E>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn fetch<F>(&self, key: K, policy: FetchPolicy, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, E>>,
    {
        let (id, future) = {
            let mut inner = self.lock();
            let now = Instant::now();
            self.evict_idle(&mut inner, now);

            let joined = match policy {
                FetchPolicy::CacheFirst => {
                    if let Some(entry) = inner.entries.get_mut(&key) {
                        if now.duration_since(entry.fetched_at) < self.stale_time {
                            entry.last_used = now;
                            debug!("Cache hit: {:?}", key);
                            return Ok(entry.value.clone());
                        }
                    }
                    inner
                        .in_flight
                        .get(&key)
                        .map(|in_flight| (in_flight.id, in_flight.future.clone()))
                }
                FetchPolicy::NetworkOnly => None,
            };

            match joined {
                Some(joined) => {
                    debug!("Joining in-flight request: {:?}", key);
                    joined
                }
                None => {
                    debug!("Cache miss: {:?}", key);
                    let id = inner.next_id;
                    inner.next_id += 1;
                    let future = fetcher().shared();
                    inner.in_flight.insert(
                        key.clone(),
                        InFlight {
                            id,
                            future: future.clone(),
                        },
                    );
                    (id, future)
                }
            }
        };

        let result = future.await;

        // Whichever caller finishes first records the outcome for this request
        let mut inner = self.lock();
        if inner.in_flight.get(&key).map(|in_flight| in_flight.id) == Some(id) {
            inner.in_flight.remove(&key);
            if let Ok(value) = &result {
                let now = Instant::now();
                inner.entries.insert(
                    key,
                    CacheEntry {
                        value: value.clone(),
                        fetched_at: now,
                        last_used: now,
                    },
                );
            }
        }
        result
    }

    /// Drop every entry whose key matches. Requests already in flight for those keys
    /// still resolve for their callers but no longer write to the cache.
    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let mut inner = self.lock();
        inner.in_flight.retain(|key, _| !predicate(key));
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !predicate(key));
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!("Invalidated {} cache entries", removed);
        }
        removed
    }

    /// Evict entries that have not been used for longer than the GC window
    pub fn collect_garbage(&self) -> usize {
        let mut inner = self.lock();
        self.evict_idle(&mut inner, Instant::now())
    }

    fn evict_idle(&self, inner: &mut CacheInner<K, V, E>, now: Instant) -> usize {
        let before = inner.entries.len();
        let gc_time = self.gc_time;
        inner
            .entries
            .retain(|_, entry| now.duration_since(entry.last_used) < gc_time);
        let evicted = before - inner.entries.len();
        if evicted > 0 {
            debug!("Evicted {} idle cache entries", evicted);
        }
        evicted
    }
}

impl<K, V, E> Default for QueryCache<K, V, E>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME, DEFAULT_GC_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type TestCache = QueryCache<&'static str, u32, String>;

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: u32,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, String>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_served_from_cache() {
        let cache = TestCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 1, Duration::ZERO))
            .await;
        let second = cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 2, Duration::ZERO))
            .await;

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_is_refetched() {
        let cache = TestCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 1, Duration::ZERO))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(5 * 60 + 1)).await;

        let value = cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 2, Duration::ZERO))
            .await;
        assert_eq!(value, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_only_bypasses_fresh_entry() {
        let cache = TestCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 1, Duration::ZERO))
            .await
            .unwrap();
        let value = cache
            .fetch("a", FetchPolicy::NetworkOnly, counting_fetch(&calls, 9, Duration::ZERO))
            .await;

        assert_eq!(value, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let cached = cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 10, Duration::ZERO))
            .await;
        assert_eq!(cached, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_are_coalesced() {
        let cache = TestCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 1, Duration::from_millis(50))),
            cache.fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 2, Duration::from_millis(50))),
        );

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_not_cached() {
        let cache = TestCache::default();

        let failed = cache
            .fetch("a", FetchPolicy::CacheFirst, || async { Err("boom".to_string()) }.boxed())
            .await;
        assert_eq!(failed, Err("boom".to_string()));

        let calls = Arc::new(AtomicUsize::new(0));
        let value = cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 3, Duration::ZERO))
            .await;
        assert_eq!(value, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_entries_are_collected() {
        let cache = TestCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 1, Duration::ZERO))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(9 * 60)).await;
        assert_eq!(cache.collect_garbage(), 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.collect_garbage(), 1);
        assert_eq!(cache.collect_garbage(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_by_predicate() {
        let cache = TestCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        for key in ["keep", "drop-1", "drop-2"] {
            cache
                .fetch(key, FetchPolicy::CacheFirst, counting_fetch(&calls, 1, Duration::ZERO))
                .await
                .unwrap();
        }

        assert_eq!(cache.invalidate(|key| key.starts_with("drop")), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache
            .fetch("keep", FetchPolicy::CacheFirst, counting_fetch(&calls, 2, Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let refetched = cache
            .fetch("drop-1", FetchPolicy::CacheFirst, counting_fetch(&calls, 2, Duration::ZERO))
            .await;
        assert_eq!(refetched, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidated_in_flight_request_is_not_cached() {
        let cache = TestCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let (late, removed) = tokio::join!(
            cache.fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 1, Duration::from_millis(100))),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                cache.invalidate(|key| *key == "a")
            },
        );
        assert_eq!(late, Ok(1));
        assert_eq!(removed, 0);

        let value = cache
            .fetch("a", FetchPolicy::CacheFirst, counting_fetch(&calls, 2, Duration::ZERO))
            .await;
        assert_eq!(value, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
