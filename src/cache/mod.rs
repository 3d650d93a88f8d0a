//! Query cache
//!
//! - Deterministic cache keys built from a resource name and filter values
//! - Fresh-entry reuse, one in-flight request per key, cache-time eviction
//! - Prefix invalidation after successful mutations

mod keys;
mod mutation;
mod query_cache;

pub use keys::{cache_key, CacheKey, KeyPart};
pub use query_cache::{CacheStats, QueryCache, QueryOptions, QueryResult};
