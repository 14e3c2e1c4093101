//! Concurrent cache mapping cache keys to client handles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::client::ClientHandle;
use crate::error::Result;
use crate::key::CacheKey;

// ---------------------------------------------------------------------------
// ClientCache
// ---------------------------------------------------------------------------

/// Concurrent map from [`CacheKey`] to a live [`ClientHandle`].
///
/// Guarantees at most one live handle per key: concurrent lookups for the
/// same absent key all receive the same installed handle, and any handle
/// built speculatively by a losing caller is closed, never exposed.
///
/// Lookups take a read lock only; the write lock is held just for the
/// install window, never across construction or request I/O.
pub struct ClientCache {
    entries: RwLock<HashMap<CacheKey, Arc<ClientHandle>>>,
    stats: CacheStats,
}

impl ClientCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    /// Return the handle for `key`, building and installing one if absent.
    ///
    /// `build` runs outside any lock; if another caller installs a handle
    /// for the same key first, the speculative one is closed and the winner
    /// returned. A `build` failure installs nothing and propagates, so a
    /// later call retries construction.
    pub fn get_or_create<F>(&self, key: &CacheKey, build: F) -> Result<Arc<ClientHandle>>
    where
        F: FnOnce() -> Result<ClientHandle>,
    {
        // Fast path: existing live entry under the read lock.
        {
            let entries = self.entries.read().expect("cache lock poisoned");
            if let Some(handle) = entries.get(key) {
                if !handle.is_closed() {
                    self.stats.record_hit();
                    return Ok(Arc::clone(handle));
                }
            }
        }

        // Construct speculatively, then compare-and-install.
        let fresh = Arc::new(build()?);

        let mut entries = self.entries.write().expect("cache lock poisoned");
        if let Some(existing) = entries.get(key) {
            if !existing.is_closed() {
                // Lost the creation race: discard the speculative handle.
                debug!(key = %key, "Discarding client handle built during creation race");
                fresh.close();
                self.stats.record_hit();
                return Ok(Arc::clone(existing));
            }
            // A closed entry under this key is stale; replace it.
            debug!(key = %key, "Replacing closed client handle");
        }

        self.stats.record_create();
        entries.insert(key.clone(), Arc::clone(&fresh));
        Ok(fresh)
    }

    /// Look up `key` without creating anything.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<ClientHandle>> {
        let entries = self.entries.read().expect("cache lock poisoned");
        entries.get(key).map(Arc::clone)
    }

    /// Whether a handle is cached under `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .contains_key(key)
    }

    /// Detach and return the entry for `key`, if present.
    ///
    /// Future lookups miss, but the detached handle is not closed: callers
    /// that already hold a reference keep using it until they close it or
    /// drop the last `Arc`. Closing on teardown is [`dispose_all`]'s job.
    ///
    /// [`dispose_all`]: Self::dispose_all
    pub fn remove(&self, key: &CacheKey) -> Option<Arc<ClientHandle>> {
        let removed = self
            .entries
            .write()
            .expect("cache lock poisoned")
            .remove(key);
        if removed.is_some() {
            debug!(key = %key, "Removed client handle from cache");
            self.stats.record_eviction();
        }
        removed
    }

    /// Close every cached handle and clear the map. Used at shutdown.
    pub fn dispose_all(&self) {
        let drained: Vec<_> = {
            let mut entries = self.entries.write().expect("cache lock poisoned");
            entries.drain().collect()
        };
        for (key, handle) in drained {
            debug!(key = %key, "Closing cached client handle");
            handle.close();
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of hit/creation/eviction counters.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for ClientCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("entries", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Internal atomic counters.
#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    creations: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_create(&self) {
        self.creations.fetch_add(1, Ordering::Relaxed);
    }

    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            creations: self.creations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Lookups served from an existing entry.
    pub hits: u64,
    /// Handles installed into the cache.
    pub creations: u64,
    /// Entries detached via `remove`.
    pub evictions: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
