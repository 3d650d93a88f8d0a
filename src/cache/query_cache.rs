//! Keyed query cache with staleness, in-flight de-duplication and eviction
//!
//! Values are stored as JSON so one cache can hold every resource; typed
//! access goes through [`QueryCache::fetch_as`].

use super::keys::CacheKey;
use crate::error::{ClientError, Result};
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

/// Outcome shared by every waiter on one request
pub type QueryResult = std::result::Result<Value, Arc<ClientError>>;

type SharedFetch = Shared<BoxFuture<'static, QueryResult>>;

/// Per-query timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a result is fresh enough to skip the network
    pub stale_time: Duration,
    /// How long an unused entry is retained
    pub cache_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            cache_time: Duration::from_secs(5 * 60),
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Served from a fresh entry
    pub hits: u64,
    /// Started a network request
    pub misses: u64,
    /// Joined a request already in flight
    pub joined: u64,
}

struct Entry {
    data: Option<Value>,
    updated_at: Option<Instant>,
    last_used: Instant,
    cache_time: Duration,
    invalidated: bool,
    in_flight: Option<(u64, SharedFetch)>,
}

impl Entry {
    fn new(now: Instant, cache_time: Duration) -> Self {
        Self {
            data: None,
            updated_at: None,
            last_used: now,
            cache_time,
            invalidated: false,
            in_flight: None,
        }
    }

    fn fresh_data(&self, now: Instant, stale_time: Duration) -> Option<Value> {
        if self.invalidated {
            return None;
        }
        let updated_at = self.updated_at?;
        if now.duration_since(updated_at) < stale_time {
            self.data.clone()
        } else {
            None
        }
    }

    fn expired(&self, now: Instant) -> bool {
        self.in_flight.is_none() && now.duration_since(self.last_used) >= self.cache_time
    }
}

struct Inner {
    entries: DashMap<CacheKey, Entry>,
    next_fetch_id: AtomicU64,
    invalidations: broadcast::Sender<CacheKey>,
    hits: AtomicU64,
    misses: AtomicU64,
    joined: AtomicU64,
}

/// Shared query cache handle; clones refer to the same cache
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                next_fetch_id: AtomicU64::new(1),
                invalidations,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                joined: AtomicU64::new(0),
            }),
        }
    }

    /// Fetch `key`, going to the network only when needed
    ///
    /// A fresh entry is returned as is. If a request for the key is already
    /// in flight the caller waits on that request. Otherwise the future built
    /// by `fetcher` becomes the key's request. `fetcher` is always called, but
    /// its future is only polled when it is the one sent.
    pub async fn fetch<F, Fut>(&self, key: &CacheKey, options: QueryOptions, fetcher: F) -> QueryResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.evict_expired();
        let candidate = fetcher();
        let now = Instant::now();

        let (fetch_id, request) = {
            let mut entry = self
                .inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now, options.cache_time));
            entry.last_used = now;
            entry.cache_time = options.cache_time;

            if let Some(data) = entry.fresh_data(now, options.stale_time) {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Query cache hit");
                return Ok(data);
            }

            match entry.in_flight.as_ref() {
                Some((id, request)) => {
                    self.inner.joined.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, "Joining in-flight query");
                    (*id, request.clone())
                }
                None => {
                    self.inner.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, "Query cache miss, fetching");
                    let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                    let request = candidate.map(|r| r.map_err(Arc::new)).boxed().shared();
                    entry.in_flight = Some((id, request.clone()));
                    (id, request)
                }
            }
        };

        let result = request.await;
        self.complete(key, fetch_id, &result);
        result
    }

    /// Typed [`fetch`](Self::fetch)
    pub async fn fetch_as<T, F, Fut>(
        &self,
        key: &CacheKey,
        options: QueryOptions,
        fetcher: F,
    ) -> std::result::Result<T, Arc<ClientError>>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let value = self.fetch(key, options, fetcher).await?;
        serde_json::from_value(value).map_err(|e| Arc::new(ClientError::from(e)))
    }

    fn complete(&self, key: &CacheKey, fetch_id: u64, result: &QueryResult) {
        let Some(mut entry) = self.inner.entries.get_mut(key) else {
            return;
        };
        // A newer request or an invalidation has superseded this one
        if !matches!(entry.in_flight, Some((id, _)) if id == fetch_id) {
            return;
        }
        entry.in_flight = None;
        if let Ok(value) = result {
            entry.data = Some(value.clone());
            entry.updated_at = Some(Instant::now());
            entry.invalidated = false;
        }
    }

    /// Last known data for `key`, fresh or not
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.inner.entries.get(key).and_then(|e| e.data.clone())
    }

    /// Seed or overwrite an entry, marking it fresh
    pub fn set(&self, key: &CacheKey, value: Value) {
        let now = Instant::now();
        let mut entry = self
            .inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now, QueryOptions::default().cache_time));
        entry.data = Some(value);
        entry.updated_at = Some(now);
        entry.last_used = now;
        entry.invalidated = false;
    }

    /// Whether a request for `key` is currently running
    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.inner
            .entries
            .get(key)
            .map(|e| e.in_flight.is_some())
            .unwrap_or(false)
    }

    /// Mark every key under `prefix` stale and notify subscribers
    ///
    /// Requests already in flight for those keys are detached: their results
    /// are still returned to whoever awaits them but are not stored.
    pub fn invalidate(&self, prefix: &CacheKey) -> usize {
        let mut count = 0;
        for mut entry in self.inner.entries.iter_mut() {
            if entry.key().starts_with(prefix) {
                entry.invalidated = true;
                entry.in_flight = None;
                count += 1;
            }
        }
        debug!(prefix = %prefix, count, "Invalidated queries");
        // No receivers is fine
        let _ = self.inner.invalidations.send(prefix.clone());
        count
    }

    /// Stream of invalidated prefixes
    pub fn subscribe(&self) -> broadcast::Receiver<CacheKey> {
        self.inner.invalidations.subscribe()
    }

    /// Drop every key under `prefix`
    pub fn remove(&self, prefix: &CacheKey) -> usize {
        let before = self.inner.entries.len();
        self.inner.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.inner.entries.len()
    }

    /// Drop entries unused for longer than their cache time
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.entries.len();
        self.inner.entries.retain(|_, entry| !entry.expired(now));
        let evicted = before.saturating_sub(self.inner.entries.len());
        if evicted > 0 {
            debug!(evicted, "Evicted unused queries");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            joined: self.inner.joined.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}
