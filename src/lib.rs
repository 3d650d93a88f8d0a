//! Rust client for the HMS (hospital management) REST API
//!
//! - [`ApiClient`]: one egress point with bearer-token injection and central
//!   401 handling through an injected [`SessionStore`] and [`Navigator`]
//! - [`QueryCache`]: cached, de-duplicated reads and prefix invalidation
//! - [`Debounced`]: trailing-edge debounce on the tokio timer
//! - [`RemoteSearch`] / [`ClientSearch`]: server-side and in-memory search
//!
//! # Example
//!
//! ```rust,no_run
//! use hms_client::{ApiClient, ClientConfig, FileSession, QueryCache, RemoteSearch, SearchOptions};
//! use std::sync::Arc;
//!
//! # async fn example() -> hms_client::Result<()> {
//! let session = Arc::new(FileSession::new(".hms-session.json"));
//! let client = ApiClient::new(ClientConfig::from_env(), session)?;
//! let cache = QueryCache::new();
//!
//! let search: RemoteSearch<serde_json::Value> =
//!     RemoteSearch::new(client, cache, SearchOptions::new("/api/patients", "patient-search"));
//! search.set_term("jane");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod claims;
pub mod config;
pub mod debounce;
pub mod error;
pub mod http;
pub mod logging;
pub mod navigation;
pub mod resources;
pub mod search;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_support;

pub use auth::AuthService;
pub use cache::{cache_key, CacheKey, KeyPart, QueryCache, QueryOptions};
pub use config::ClientConfig;
pub use debounce::{DebounceMachine, DebounceState, Debounced};
pub use error::{ClientError, Result};
pub use http::{ApiClient, ApiRequest, ApiResponse, Pipeline, ReqwestTransport, Transport};
pub use navigation::{LogNavigator, Navigator, LOGIN_PATH};
pub use resources::{Resource, ResourceApi};
pub use search::{filter_items, ClientSearch, Predicate, RemoteSearch, SearchOptions, SearchState};
pub use session::{FileSession, MemorySession, SessionStore, StoredSession};
pub use types::*;
