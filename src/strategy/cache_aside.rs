//! Cache-Aside Strategy
//!
//! Read-through caching: look in the cache first, and only on a miss ask the
//! loader, then remember the answer for `ttl`.
//!
//! There is no single-flight protection. Concurrent misses on the same key
//! each call the loader; callers that need de-duplication must add it around
//! their loader.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{validate_ttl, SharedStore};
use crate::error::{CacheError, Result};
use crate::strategy::Loader;

// == Lookup ==
/// Result of a cache-aside read.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// The value, from the cache or freshly loaded
    pub value: Value,
    /// True if served from the cache without calling the loader
    pub hit: bool,
}

impl Lookup {
    /// Splits into the `(value, hit)` pair.
    pub fn into_parts(self) -> (Value, bool) {
        (self.value, self.hit)
    }
}

// == Cache Aside ==
/// Wraps a [`Loader`] with lazy caching over a [`SharedStore`].
#[derive(Debug, Clone)]
pub struct CacheAside<L> {
    store: SharedStore,
    loader: L,
}

impl<L: Loader> CacheAside<L> {
    // == Constructor ==
    /// Creates a cache-aside reader over `store`, falling back to `loader`.
    pub fn new(store: SharedStore, loader: L) -> Self {
        Self { store, loader }
    }

    // == Get Or Load ==
    /// Returns the cached value for `key`, loading and caching it on a miss.
    ///
    /// The loader runs outside the store lock. If it fails, the error is
    /// returned as [`CacheError::Load`] and nothing is cached.
    pub async fn get_or_load(&self, key: &str, ttl: Duration) -> Result<Lookup> {
        validate_ttl(ttl)?;

        if let Some(value) = self.store.get(key).await? {
            debug!(key = %key, "cache-aside hit");
            return Ok(Lookup { value, hit: true });
        }

        debug!(key = %key, "cache-aside miss, calling loader");
        let value = match self.loader.load(key).await {
            Ok(value) => value,
            Err(source) => {
                warn!(key = %key, error = %source, "loader failed, nothing cached");
                return Err(CacheError::Load {
                    key: key.to_string(),
                    source,
                });
            }
        };

        self.store.set(key, value.clone(), ttl).await?;
        Ok(Lookup { value, hit: false })
    }

    // == Invalidate ==
    /// Drops the cached copy of `key` so the next read reloads it.
    pub async fn invalidate(&self, key: &str) -> Result<bool> {
        self.store.delete(key).await
    }

    // == Accessors ==
    /// Returns the store this reader caches into.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Returns the wrapped loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }
}
