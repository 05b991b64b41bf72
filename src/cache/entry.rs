//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::{CacheError, Result};

// == Cache Entry ==
/// Represents a single cache entry with value and expiry deadline.
///
/// Every entry carries a deadline: the store never accepts a value without a
/// TTL, so there is no "lives forever" state to model.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Creation instant
    pub created_at: Instant,
    /// Instant at which the entry becomes logically absent
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// Fails with `InvalidTtl` when the deadline does not fit in an `Instant`.
    pub fn new(value: Value, ttl: Duration) -> Result<Self> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or(CacheError::InvalidTtl)?;

        Ok(Self {
            value,
            created_at: now,
            expires_at,
        })
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its deadline, so a fully elapsed TTL is immediately a miss.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied clock.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None once the entry has expired.
    ///
    /// Never negative: an expired entry has no remaining TTL at all.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        if self.is_expired_at(now) {
            None
        } else {
            Some(self.expires_at - now)
        }
    }

    // == Counter ==
    /// Returns the value as a counter if it holds a JSON integer.
    pub fn as_counter(&self) -> Option<i64> {
        self.value.as_i64()
    }
}

/// Rounds a duration up to whole seconds, for human-facing TTL output.
pub fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
