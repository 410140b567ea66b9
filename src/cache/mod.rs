//! Profile cache.
//!
//! The lookup service talks to the cache through [`ProfileCache`] so tests
//! can substitute their own store. [`MemoryProfileCache`] is the production
//! implementation: bounded, LRU, with a fixed time-to-live per entry.

pub mod memory;

use std::sync::Arc;

use crate::lookup::profile::Profile;

pub use memory::MemoryProfileCache;

/// Shared key → profile store.
///
/// Values are immutable snapshots; a hit hands out another reference to the
/// same `Arc<Profile>`.
pub trait ProfileCache: Send + Sync {
    /// The live entry for `key`, if any. Expired entries are absent.
    fn get(&self, key: &str) -> Option<Arc<Profile>>;

    /// Insert or replace the entry for `key`.
    fn set(&self, key: String, profile: Arc<Profile>);
}
