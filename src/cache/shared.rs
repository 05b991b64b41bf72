//! Shared Store Module
//!
//! Cloneable handle around a [`CacheStore`] guarded by a single tokio
//! `RwLock`. Every operation is one short critical section, so each call is
//! atomic with respect to every other call. Nothing awaits I/O while the lock
//! is held.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{CacheStats, CacheStore};
use crate::error::Result;

// == Shared Store ==
/// Thread-safe handle to a cache store.
///
/// Construct one at startup and clone it into every consumer; clones share
/// the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<CacheStore>>,
}

impl SharedStore {
    // == Constructor ==
    /// Creates a handle around a fresh, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing store.
    pub fn from_store(store: CacheStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    // == Reads and Writes ==
    /// Returns an owned copy of the value, or None on a miss.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.write().await.get(key)
    }

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    pub async fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) -> Result<()> {
        self.inner.write().await.set(key.into(), value, ttl)
    }

    // == Deletes ==
    /// Deletes `key`. Returns true if a live entry was removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.write().await.delete(key)
    }

    /// Deletes every live key matching `pattern` and returns the count.
    pub async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        self.inner.write().await.delete_matching(pattern)
    }

    /// Lists live keys matching `pattern`.
    pub async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        self.inner.read().await.keys_matching(pattern)
    }

    /// Deletes exact keys plus pattern matches; returns the removed names.
    pub async fn invalidate(&self, keys: &[&str], patterns: &[&str]) -> Result<Vec<String>> {
        self.inner.write().await.invalidate(keys, patterns)
    }

    // == Inspection ==
    /// Checks for a live entry without touching statistics.
    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.read().await.exists(key)
    }

    /// Returns the remaining TTL of a live entry.
    pub async fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>> {
        self.inner.read().await.ttl_remaining(key)
    }

    // == Counters ==
    /// Atomic fetch-add on a fixed-window counter.
    pub async fn increment(&self, key: &str, window: Duration) -> Result<i64> {
        self.inner.write().await.increment(key, window)
    }

    /// Atomic fetch-add that also reports the time left in the window.
    pub async fn increment_window(&self, key: &str, window: Duration) -> Result<(i64, Duration)> {
        self.inner.write().await.increment_window(key, window)
    }

    // == Typed Helpers ==
    /// Reads a JSON value and deserializes it into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` to JSON and stores it.
    ///
    /// Serialization happens before the lock is taken.
    pub async fn set_json<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value, ttl).await
    }

    // == Maintenance ==
    /// Lists keys whose TTL has elapsed but are still stored.
    pub async fn expired_keys(&self) -> Vec<String> {
        self.inner.read().await.expired_keys()
    }

    /// Removes one key if it is still expired.
    pub async fn remove_if_expired(&self, key: &str) -> bool {
        self.inner.write().await.remove_if_expired(key)
    }

    /// Returns a snapshot of the statistics.
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    /// Returns the number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// True if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drops every entry, as a process restart would.
    pub async fn clear(&self) {
        self.inner.write().await.clear()
    }
}
