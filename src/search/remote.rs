//! Debounced, cached server-side search
//!
//! The raw term is debounced, keyed as `(search_key, term)` and fetched
//! through the query cache. While a new key loads, the previous key's rows
//! stay visible. Results are applied only if they belong to the most recent
//! fetch, so a slow response for an old term never replaces a newer one.

use crate::cache::{cache_key, CacheKey, QueryCache, QueryOptions};
use crate::debounce::Debounced;
use crate::error::ClientError;
use crate::http::{ApiClient, ApiRequest};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Configuration for [`RemoteSearch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// List endpoint, e.g. `/api/patients`
    pub endpoint: String,
    /// Cache key prefix distinguishing this search from others
    pub search_key: String,
    /// Quiet period before a term is sent
    pub debounce: Duration,
    /// When false no request is issued
    pub enabled: bool,
    /// Retention of unused results
    pub cache_time: Duration,
    /// Window in which a cached result is reused without a request
    pub stale_time: Duration,
}

impl SearchOptions {
    pub fn new(endpoint: impl Into<String>, search_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            search_key: search_key.into(),
            debounce: Duration::from_millis(300),
            enabled: true,
            cache_time: Duration::from_secs(10 * 60),
            stale_time: Duration::from_secs(5 * 60),
        }
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce = Duration::from_millis(ms);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time = cache_time;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            stale_time: self.stale_time,
            cache_time: self.cache_time,
        }
    }

    /// Cache key for a settled term
    pub fn key_for(&self, term: &str) -> CacheKey {
        cache_key(&self.search_key, [term])
    }

    /// Request for a settled term; blank terms list everything
    pub fn request_for(&self, term: &str) -> ApiRequest {
        let request = ApiRequest::get(self.endpoint.clone());
        match term.trim() {
            "" => request,
            trimmed => request.query("search", trimmed),
        }
    }
}

/// What a consumer renders
#[derive(Debug, Clone)]
pub struct SearchState<T> {
    /// Key of the most recent request
    pub key: Option<CacheKey>,
    /// Rows to show; may belong to an earlier key while loading
    pub data: Option<Vec<T>>,
    /// A request for `key` is outstanding
    pub is_loading: bool,
    /// `data` belongs to an earlier key
    pub is_previous_data: bool,
    /// Failure of the most recent request
    pub error: Option<Arc<ClientError>>,
    generation: u64,
}

impl<T> Default for SearchState<T> {
    fn default() -> Self {
        Self {
            key: None,
            data: None,
            is_loading: false,
            is_previous_data: false,
            error: None,
            generation: 0,
        }
    }
}

impl<T> SearchState<T> {
    /// Settled for `key`: loaded or failed, not loading
    pub fn is_settled_for(&self, key: &CacheKey) -> bool {
        self.key.as_ref() == Some(key) && !self.is_loading
    }
}

/// Server-side search bound to one endpoint
///
/// Must be created inside a tokio runtime. Dropping it stops the debounce
/// timer and the driver; requests already sent run to completion and their
/// results are discarded.
pub struct RemoteSearch<T> {
    term: Debounced<String>,
    state: watch::Receiver<SearchState<T>>,
    driver: JoinHandle<()>,
}

impl<T> RemoteSearch<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(client: ApiClient, cache: QueryCache, options: SearchOptions) -> Self {
        Self::with_term(client, cache, options, String::new())
    }

    /// Start with `initial` already settled
    pub fn with_term(
        client: ApiClient,
        cache: QueryCache,
        options: SearchOptions,
        initial: impl Into<String>,
    ) -> Self {
        let term = Debounced::new(initial.into(), options.debounce);
        let (state_tx, state) = watch::channel(SearchState::default());
        let driver = Driver {
            client,
            cache,
            options,
            state: Arc::new(state_tx),
            generation: 0,
        };
        let driver = tokio::spawn(driver.run(term.subscribe()));
        Self {
            term,
            state,
            driver,
        }
    }

    /// Feed the raw, per-keystroke term
    pub fn set_term(&self, term: impl Into<String>) {
        self.term.set(term.into());
    }

    /// The term currently used for requests
    pub fn debounced_term(&self) -> String {
        self.term.get()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SearchState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SearchState<T>> {
        self.state.clone()
    }
}

impl<T> Drop for RemoteSearch<T> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

struct Driver<T> {
    client: ApiClient,
    cache: QueryCache,
    options: SearchOptions,
    state: Arc<watch::Sender<SearchState<T>>>,
    generation: u64,
}

impl<T> Driver<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn run(mut self, mut terms: watch::Receiver<String>) {
        let mut invalidations = self.cache.subscribe();
        let mut term = terms.borrow_and_update().clone();
        self.start(&term);

        loop {
            tokio::select! {
                changed = terms.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    term = terms.borrow_and_update().clone();
                    self.start(&term);
                }
                event = invalidations.recv() => match event {
                    Ok(prefix) => {
                        if self.options.key_for(&term).starts_with(&prefix) {
                            debug!(key = %prefix, "Search invalidated, refetching");
                            self.start(&term);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "Missed invalidations, refetching search");
                        self.start(&term);
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                },
            }
        }
    }

    fn start(&mut self, term: &str) {
        if !self.options.enabled {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let key = self.options.key_for(term);
        let cached = self
            .cache
            .get(&key)
            .and_then(|value| serde_json::from_value::<Vec<T>>(value).ok());

        self.state.send_modify(|state| {
            let same_key = state.key.as_ref() == Some(&key);
            state.key = Some(key.clone());
            state.generation = generation;
            state.is_loading = true;
            state.error = None;
            match cached {
                Some(rows) => {
                    state.data = Some(rows);
                    state.is_previous_data = false;
                }
                None => state.is_previous_data = state.data.is_some() && !same_key,
            }
        });

        let request = self.options.request_for(term);
        let client = self.client.clone();
        let cache = self.cache.clone();
        let options = self.options.query_options();
        let state = self.state.clone();

        tokio::spawn(async move {
            let result = cache
                .fetch_as::<Vec<T>, _, _>(&key, options, move || async move {
                    client.send_json::<serde_json::Value>(request).await
                })
                .await;

            state.send_modify(|state| {
                if state.generation != generation {
                    debug!(key = %key, "Discarding superseded search result");
                    return;
                }
                state.is_loading = false;
                match result {
                    Ok(rows) => {
                        state.data = Some(rows);
                        state.is_previous_data = false;
                        state.error = None;
                    }
                    Err(e) => state.error = Some(e),
                }
            });
        });
    }
}
