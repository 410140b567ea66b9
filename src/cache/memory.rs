//! In-memory profile cache backed by moka.

use std::sync::Arc;
use std::time::Duration;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::cache::ProfileCache;
use crate::config::CacheConfig;
use crate::lookup::profile::Profile;
use crate::observability::metrics;

/// A thread-safe, bounded, expiring profile cache.
#[derive(Clone)]
pub struct MemoryProfileCache {
    inner: Cache<String, Arc<Profile>>,
}

impl MemoryProfileCache {
    /// Create a cache holding at most `max_entries` profiles for `ttl` each.
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self { inner }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, Duration::from_secs(config.ttl_secs))
    }
}

impl ProfileCache for MemoryProfileCache {
    fn get(&self, key: &str) -> Option<Arc<Profile>> {
        self.inner.get(key)
    }

    fn set(&self, key: String, profile: Arc<Profile>) {
        self.inner.insert(key, profile);
        metrics::record_cache_size(self.inner.entry_count());
    }
}
