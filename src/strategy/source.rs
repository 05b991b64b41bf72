//! Source of Truth Ports
//!
//! Traits the caller implements to connect a caching strategy to the
//! authoritative data (a database query, an external API, ...). The cache
//! never looks inside their errors and never retries them.

use async_trait::async_trait;
use serde_json::Value;

/// Reads the authoritative value for a key.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Fetches the value for `key`.
    ///
    /// A "not found" in the source is the loader's call to make: return an
    /// error to propagate it, or a JSON `null` to cache the absence.
    async fn load(&self, key: &str) -> anyhow::Result<Value>;
}

/// Persists values to the authoritative store.
#[async_trait]
pub trait Writer: Send + Sync {
    /// Durably stores `value` under `key`.
    async fn write(&self, key: &str, value: &Value) -> anyhow::Result<()>;

    /// Removes `key` from the source of truth.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
