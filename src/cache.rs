//! Time-bounded cache with a get-or-compute contract.
//!
//! The cache shields the upstream API from redundant traffic. Entries carry a
//! per-entry TTL and are checked lazily on read; a background sweeper task
//! additionally removes expired entries on a fixed interval to bound memory.
//! The cache has no knowledge of incident semantics.

use crate::error::Result;
use regex::Regex;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// Explicitly constructed, injectable key/value cache.
///
/// Cloning is cheap and shares the underlying map.
#[derive(Clone)]
pub struct BoundedCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl Default for BoundedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundedCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the cached value for `key`, or invoke `fetcher` to compute it.
    ///
    /// On a hit (entry present and younger than its TTL) the stored value is
    /// returned without invoking `fetcher`. On a miss or expiry, `fetcher`
    /// runs and its result is stored with a fresh timestamp. If `fetcher`
    /// fails, the error propagates and no entry is written, so the next call
    /// retries from scratch.
    ///
    /// Overlapping misses for the same key each invoke their own fetch; there
    /// is no in-flight de-duplication.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: Duration, fetcher: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if !entry.is_expired(Instant::now()) {
                    if let Some(value) = entry.value.downcast_ref::<T>() {
                        trace!(key, "cache hit");
                        return Ok(value.clone());
                    }
                }
            }
        }

        trace!(key, "cache miss, fetching");
        let value = fetcher().await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: Arc::new(value.clone()),
                inserted_at: Instant::now(),
                ttl,
            },
        );
        Ok(value)
    }

    /// Remove a single entry. Returns whether an entry was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Remove every entry whose key matches `pattern`. Returns the count.
    pub async fn invalidate_pattern(&self, pattern: &Regex) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !pattern.is_match(key));
        before - entries.len()
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove expired entries. Advisory housekeeping; expiry is also checked
    /// lazily on read, so correctness does not depend on the sweep cadence.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "cache sweep removed expired entries");
        }
        removed
    }

    /// Start a background task sweeping expired entries every `interval`.
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        let cache = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh cache
            // is not swept before anything has expired.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.sweep().await;
            }
        });
        SweeperHandle { task }
    }
}

/// Handle for the background sweeper; aborts the task when dropped.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
