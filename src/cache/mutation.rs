//! Write-then-invalidate helper
//!
//! Mirrors the page flow: submit a mutation, and only once it succeeds mark
//! the affected queries stale so their observers refetch.

use super::keys::CacheKey;
use super::query_cache::QueryCache;
use crate::error::Result;
use std::future::Future;
use tracing::debug;

impl QueryCache {
    /// Await `mutation`; on success invalidate every prefix in `invalidates`
    ///
    /// Failed mutations leave the cache untouched and return the error.
    pub async fn mutate<T, Fut>(&self, invalidates: &[CacheKey], mutation: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let output = mutation.await?;
        for prefix in invalidates {
            self.invalidate(prefix);
        }
        debug!(invalidated = invalidates.len(), "Mutation applied");
        Ok(output)
    }
}
