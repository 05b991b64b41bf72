//! Fixed-Window Rate Limiter
//!
//! Counts requests per client in the shared store with `increment`. The
//! first request of a window creates the counter and fixes its expiry; the
//! counter disappears when the window elapses and the next request starts a
//! new one.
//!
//! This is a fixed window, not a sliding one: a burst straddling a window
//! boundary can be admitted up to `2 * limit` times.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::{ceil_secs, SharedStore};
use crate::error::{CacheError, Result};

// == Rate Decision ==
/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateDecision {
    /// Whether this request is within the limit
    pub allowed: bool,
    /// Requests counted in the current window, this one included
    pub count: u64,
    /// Maximum requests per window
    pub limit: u64,
    /// Requests left in the current window
    pub remaining: u64,
    /// Time until the window resets
    pub reset_in: Duration,
}

impl RateDecision {
    /// Whole seconds until the window resets, for Retry-After style output.
    pub fn retry_after_secs(&self) -> u64 {
        ceil_secs(self.reset_in)
    }
}

// == Rate Limiter ==
/// Fixed-window limiter backed by a [`SharedStore`].
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: SharedStore,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates a limiter that keeps its counters in `store`.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Store key used for a client's counter.
    pub fn key_for(client_key: &str) -> String {
        format!("rate:{}", client_key)
    }

    // == Allow ==
    /// Counts one request from `client_key` and decides whether to admit it.
    ///
    /// The count and the window's remaining time are read in the same
    /// critical section as the increment.
    pub async fn allow(&self, client_key: &str, limit: u64, window: Duration) -> Result<RateDecision> {
        if limit == 0 {
            return Err(CacheError::InvalidArgument(
                "Rate limit must be at least 1".to_string(),
            ));
        }

        let key = Self::key_for(client_key);
        let (count, reset_in) = self.store.increment_window(&key, window).await?;
        // Anything below 1 means the key held a value this limiter never wrote.
        let count = u64::try_from(count)
            .ok()
            .filter(|&count| count > 0)
            .ok_or_else(|| {
                CacheError::InvalidArgument(format!("Rate counter at '{}' is not a request count", key))
            })?;

        let decision = RateDecision {
            allowed: count <= limit,
            count,
            limit,
            remaining: limit.saturating_sub(count),
            reset_in,
        };

        debug!(
            client = %client_key,
            count = count,
            limit = limit,
            allowed = decision.allowed,
            "rate limit check"
        );
        Ok(decision)
    }
}
