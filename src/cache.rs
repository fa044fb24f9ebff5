//! Bounded caches for expensive external lookups.
//!
//! Entity resolution, neighbor expansion, and embedding generation are pure
//! functions of their input, so caching is correctness-neutral: it exists to
//! bound repeated external calls within and across requests for the process
//! lifetime. Degraded results (no match, empty set) are cached as values.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use moka::future::Cache;

use crate::config::CacheConfig;
use crate::kg::EntityId;

/// A bounded `get_or_compute` cache over an expensive lookup.
///
/// Entries are evicted once the configured capacity is exceeded; there is no
/// explicit invalidation and nothing is persisted across restarts.
#[derive(Clone)]
pub struct LookupCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> LookupCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache bounded to `capacity` entries.
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// Concurrent misses for the same key may race; the computed value is
    /// idempotent so last-writer-wins is acceptable.
    pub async fn get_or_compute<F, Fut>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        self.inner.get_with(key, init()).await
    }

    /// Approximate number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Flush pending internal maintenance (used by tests).
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

/// The process-wide cache bundle, constructed once at the composition root
/// and injected into the clients that need it.
#[derive(Clone)]
pub struct EngineCaches {
    /// term -> resolved identifier (or no match)
    pub resolution: LookupCache<String, Option<EntityId>>,
    /// sorted term list -> resolved identifier set
    pub term_lists: LookupCache<Vec<String>, Arc<std::collections::HashSet<EntityId>>>,
    /// capped identifier list -> neighbor identifier set
    pub neighbors: LookupCache<Vec<EntityId>, Arc<std::collections::HashSet<EntityId>>>,
    /// normalized text -> embedding vector (or absent)
    pub embeddings: LookupCache<String, Option<Arc<Vec<f32>>>>,
}

impl EngineCaches {
    /// Build all caches from configured capacities.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            resolution: LookupCache::new(config.resolution_capacity),
            term_lists: LookupCache::new(config.term_list_capacity),
            neighbors: LookupCache::new(config.neighbor_capacity),
            embeddings: LookupCache::new(config.embedding_capacity),
        }
    }
}

impl Default for EngineCaches {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_get_or_compute_memoizes() {
        let cache: LookupCache<String, u32> = LookupCache::new(16);
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            42u32
        };

        assert_eq!(cache.get_or_compute("k".to_string(), compute).await, 42);
        assert_eq!(
            cache
                .get_or_compute("k".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    7u32
                })
                .await,
            42
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_match_is_cached() {
        let cache: LookupCache<String, Option<EntityId>> = LookupCache::new(16);

        let miss = cache
            .get_or_compute("unknown term".to_string(), || async { None })
            .await;
        assert!(miss.is_none());

        // A later hit must not recompute into a different value.
        let hit = cache
            .get_or_compute("unknown term".to_string(), || async {
                Some(EntityId::from("Q1"))
            })
            .await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_capacity_bounds_entries() {
        let cache: LookupCache<u32, u32> = LookupCache::new(8);
        for i in 0..64u32 {
            cache.get_or_compute(i, || async move { i }).await;
        }
        cache.run_pending_tasks().await;
        assert!(cache.entry_count() <= 8);
    }

    #[test]
    fn test_default_capacities() {
        // Constructing the bundle must honor the configured capacities.
        let caches = EngineCaches::default();
        assert_eq!(caches.resolution.entry_count(), 0);
        assert_eq!(caches.neighbors.entry_count(), 0);
    }
}
