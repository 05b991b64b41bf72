//! Write-Through Strategy
//!
//! Every write goes to the source of truth first and, only once it has been
//! persisted, to the cache. A failed write never reaches the cache, so the
//! cache cannot hold a value the source does not have.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{validate_key, validate_ttl, KeyPattern, SharedStore};
use crate::error::{CacheError, Result};
use crate::strategy::Writer;

// == Write Through ==
/// Wraps a [`Writer`] so writes update the source and the cache together.
#[derive(Debug, Clone)]
pub struct WriteThrough<W> {
    store: SharedStore,
    writer: W,
}

impl<W: Writer> WriteThrough<W> {
    // == Constructor ==
    /// Creates a write-through layer over `store`, persisting through `writer`.
    pub fn new(store: SharedStore, writer: W) -> Self {
        Self { store, writer }
    }

    // == Write ==
    /// Persists `value` and then caches it under `key` for `ttl`.
    pub async fn write(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.write_and_invalidate(key, value, ttl, &[]).await.map(|_| ())
    }

    /// Persists and caches `value`, then drops every cached key matching
    /// `invalidate_patterns` (list pages, aggregates derived from it).
    ///
    /// Returns the number of derived entries removed. Arguments are validated
    /// before the writer runs, so misuse never leaves a half-applied write.
    pub async fn write_and_invalidate(
        &self,
        key: &str,
        value: Value,
        ttl: Duration,
        invalidate_patterns: &[&str],
    ) -> Result<usize> {
        validate_key(key)?;
        validate_ttl(ttl)?;
        let patterns = compile_patterns(invalidate_patterns)?;

        if let Err(source) = self.writer.write(key, &value).await {
            warn!(key = %key, error = %source, "writer failed, cache untouched");
            return Err(CacheError::Write {
                key: key.to_string(),
                source,
            });
        }

        self.store.set(key, value, ttl).await?;

        let mut removed = 0;
        for pattern in &patterns {
            removed += self.store.delete_matching(pattern.as_str()).await?;
        }

        debug!(key = %key, invalidated = removed, "write-through complete");
        Ok(removed)
    }

    // == Remove ==
    /// Removes `key` from the source of truth, then from the cache together
    /// with every key matching `invalidate_patterns`.
    ///
    /// Returns the cache keys that were dropped. A failed removal leaves the
    /// cache as it was.
    pub async fn remove(&self, key: &str, invalidate_patterns: &[&str]) -> Result<Vec<String>> {
        validate_key(key)?;
        compile_patterns(invalidate_patterns)?;

        if let Err(source) = self.writer.remove(key).await {
            warn!(key = %key, error = %source, "remove failed, cache untouched");
            return Err(CacheError::Write {
                key: key.to_string(),
                source,
            });
        }

        let removed = self.store.invalidate(&[key], invalidate_patterns).await?;
        debug!(key = %key, invalidated = removed.len(), "removed from source and cache");
        Ok(removed)
    }

    // == Accessors ==
    /// Returns the store this layer writes to.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Returns the wrapped writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

fn compile_patterns(patterns: &[&str]) -> Result<Vec<KeyPattern>> {
    patterns.iter().map(|p| KeyPattern::new(p)).collect()
}
