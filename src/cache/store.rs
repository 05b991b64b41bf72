//! Cache Store Module
//!
//! Main cache engine: HashMap storage with lazy TTL expiration, glob
//! invalidation and counters. `CacheStore` itself is not synchronized; wrap it
//! in [`SharedStore`](crate::cache::SharedStore) to share it between tasks.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats, KeyPattern, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Main cache storage with TTL support.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new, empty CacheStore.
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a key-value pair expiring `ttl` from now.
    ///
    /// If the key already exists, the value is overwritten and the TTL is
    /// reset (last writer wins).
    pub fn set(&mut self, key: String, value: Value, ttl: Duration) -> Result<()> {
        validate_key(&key)?;
        validate_ttl(ttl)?;

        self.entries.insert(key, CacheEntry::new(value, ttl)?);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` on a miss. An expired entry is removed on the spot and
    /// counted as a miss.
    pub fn get(&mut self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Ok(Some(value))
            }
            Some(_) => {
                self.reap(key);
                self.stats.record_miss();
                Ok(None)
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Exists ==
    /// Checks for a live entry without touching statistics.
    pub fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.live_entry(key).is_some())
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns true if a live entry was removed. Deleting a missing or
    /// already-expired key is not an error.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let removed = match self.entries.remove(key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_invalidations(1);
                true
            }
            Some(_) => {
                self.stats.record_expirations(1);
                false
            }
            None => false,
        };

        self.stats.set_total_entries(self.entries.len());
        Ok(removed)
    }

    // == Delete Matching ==
    /// Removes every live key matching a glob pattern and returns how many.
    ///
    /// Expired entries that happen to match are reaped as well but are not
    /// reported as invalidated.
    pub fn delete_matching(&mut self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::new(pattern)?;
        Ok(self.remove_matching(&pattern).len())
    }

    // == Keys Matching ==
    /// Lists live keys matching a glob pattern.
    pub fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = KeyPattern::new(pattern)?;
        let now = Instant::now();

        Ok(self
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    // == Invalidate ==
    /// Deletes exact keys and every key matching any of `patterns`.
    ///
    /// Returns the names of the live entries actually removed. All arguments
    /// are validated before anything is deleted.
    pub fn invalidate(&mut self, keys: &[&str], patterns: &[&str]) -> Result<Vec<String>> {
        for key in keys {
            validate_key(key)?;
        }
        let patterns = patterns
            .iter()
            .map(|p| KeyPattern::new(p))
            .collect::<Result<Vec<_>>>()?;

        let mut removed = Vec::new();
        for key in keys {
            if self.delete(key)? {
                removed.push((*key).to_string());
            }
        }
        for pattern in &patterns {
            removed.extend(self.remove_matching(pattern));
        }

        Ok(removed)
    }

    // == TTL Remaining ==
    /// Returns the remaining TTL of a live entry, or None if absent/expired.
    pub fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>> {
        validate_key(key)?;
        Ok(self.live_entry(key).and_then(CacheEntry::ttl_remaining))
    }

    // == Increment ==
    /// Atomically adds one to an integer counter and returns the new value.
    ///
    /// A missing (or expired) key starts from zero with `window` as its TTL.
    /// Later increments leave the deadline alone, so the window is fixed.
    pub fn increment(&mut self, key: &str, window: Duration) -> Result<i64> {
        self.increment_window(key, window).map(|(count, _)| count)
    }

    /// Like [`increment`](Self::increment), also returning the time left in
    /// the window as observed under the same borrow.
    pub fn increment_window(&mut self, key: &str, window: Duration) -> Result<(i64, Duration)> {
        validate_key(key)?;
        validate_ttl(window)?;

        let now = Instant::now();
        if self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now))
        {
            self.reap(key);
        }

        let entry = match self.entries.entry(key.to_string()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => slot.insert(CacheEntry::new(Value::from(0), window)?),
        };

        let current = entry.as_counter().ok_or_else(|| {
            CacheError::InvalidArgument(format!("Value at '{}' is not an integer", key))
        })?;
        let next = current.checked_add(1).ok_or_else(|| {
            CacheError::InvalidArgument(format!("Increment would overflow '{}'", key))
        })?;

        entry.value = Value::from(next);
        let remaining = entry.ttl_remaining().unwrap_or(Duration::ZERO);

        self.stats.set_total_entries(self.entries.len());
        Ok((next, remaining))
    }

    // == Expiry Sweep Support ==
    /// Lists keys whose TTL has elapsed but which are still stored.
    pub fn expired_keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Removes `key` only if it is still expired. Returns true if removed.
    ///
    /// Re-checks the deadline so an entry re-set since it was listed survives.
    pub fn remove_if_expired(&mut self, key: &str) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.reap(key);
                true
            }
            _ => false,
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Clear ==
    /// Drops every entry, keeping statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet reaped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Internals ==
    fn live_entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    fn reap(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
        }
    }

    fn remove_matching(&mut self, pattern: &KeyPattern) -> Vec<String> {
        let now = Instant::now();
        let matched: Vec<(String, bool)> = self
            .entries
            .iter()
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, entry)| (key.clone(), entry.is_expired_at(now)))
            .collect();

        let mut live = Vec::with_capacity(matched.len());
        let mut expired = 0;
        for (key, is_expired) in matched {
            self.entries.remove(&key);
            if is_expired {
                expired += 1;
            } else {
                live.push(key);
            }
        }

        self.stats.record_invalidations(live.len());
        self.stats.record_expirations(expired);
        self.stats.set_total_entries(self.entries.len());
        live
    }
}

// == Validation ==
/// Rejects empty keys and keys longer than [`MAX_KEY_LENGTH`] bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Rejects a zero TTL, and one whose deadline would overflow the clock.
/// `Duration` already rules out negative ones.
pub fn validate_ttl(ttl: Duration) -> Result<()> {
    if ttl.is_zero() || Instant::now().checked_add(ttl).is_none() {
        Err(CacheError::InvalidTtl)
    } else {
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_store_new() {
        let store = CacheStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new();

        store.set("product:1".to_string(), json!({"id": 1}), MINUTE).unwrap();
        let value = store.get("product:1").unwrap();

        assert_eq!(value, Some(json!({"id": 1})));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new();
        assert_eq!(store.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_store_zero_ttl_rejected() {
        let mut store = CacheStore::new();

        let result = store.set("key".to_string(), json!(1), Duration::ZERO);
        assert!(matches!(result, Err(CacheError::InvalidTtl)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_delete() {
        let mut store = CacheStore::new();

        store.set("key1".to_string(), json!("value1"), MINUTE).unwrap();
        assert!(store.delete("key1").unwrap());

        assert!(store.is_empty());
        assert_eq!(store.get("key1").unwrap(), None);
    }

    #[test]
    fn test_store_delete_nonexistent_is_idempotent() {
        let mut store = CacheStore::new();

        assert!(!store.delete("nonexistent").unwrap());
        assert!(!store.delete("nonexistent").unwrap());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new();

        store.set("key1".to_string(), json!("value1"), MINUTE).unwrap();
        store.set("key1".to_string(), json!("value2"), MINUTE).unwrap();

        assert_eq!(store.get("key1").unwrap(), Some(json!("value2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration_is_lazy() {
        let mut store = CacheStore::new();

        store.set("key1".to_string(), json!("value1"), Duration::from_millis(1)).unwrap();
        sleep(Duration::from_millis(20));

        // Still physically present until the next access.
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("key1").unwrap(), None);
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_store_delete_matching() {
        let mut store = CacheStore::new();

        store.set("products:list:all:page1:limit10".to_string(), json!([]), MINUTE).unwrap();
        store.set("products:list:electronics:page1:limit10".to_string(), json!([]), MINUTE).unwrap();
        store.set("product:1".to_string(), json!({"id": 1}), MINUTE).unwrap();

        let removed = store.delete_matching("products:list:*").unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("product:1").unwrap().is_some());
    }

    #[test]
    fn test_store_delete_matching_skips_expired_in_count() {
        let mut store = CacheStore::new();

        store.set("a:1".to_string(), json!(1), Duration::from_millis(1)).unwrap();
        store.set("a:2".to_string(), json!(2), MINUTE).unwrap();
        sleep(Duration::from_millis(20));

        assert_eq!(store.delete_matching("*").unwrap(), 1);
        assert!(store.is_empty());

        let stats = store.stats();
        assert_eq!(stats.invalidations, 1);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_store_delete_matching_empty_pattern() {
        let mut store = CacheStore::new();
        assert!(matches!(
            store.delete_matching(""),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_store_keys_matching() {
        let mut store = CacheStore::new();

        store.set("weather:london".to_string(), json!({}), MINUTE).unwrap();
        store.set("weather:paris".to_string(), json!({}), MINUTE).unwrap();
        store.set("trending:topics".to_string(), json!([]), MINUTE).unwrap();

        let mut keys = store.keys_matching("weather:*").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["weather:london", "weather:paris"]);
    }

    #[test]
    fn test_store_invalidate_reports_removed_keys() {
        let mut store = CacheStore::new();

        store.set("product:7".to_string(), json!({"id": 7}), MINUTE).unwrap();
        store.set("products:list:all:page1:limit10".to_string(), json!([]), MINUTE).unwrap();
        store.set("product:8".to_string(), json!({"id": 8}), MINUTE).unwrap();

        let removed = store
            .invalidate(&["product:7", "product:99"], &["products:list:*"])
            .unwrap();

        assert_eq!(removed, vec!["product:7", "products:list:all:page1:limit10"]);
        assert!(store.exists("product:8").unwrap());
    }

    #[test]
    fn test_store_invalidate_validates_first() {
        let mut store = CacheStore::new();
        store.set("product:7".to_string(), json!({"id": 7}), MINUTE).unwrap();

        let result = store.invalidate(&["product:7"], &[""]);

        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert!(store.exists("product:7").unwrap());
    }

    #[test]
    fn test_store_ttl_remaining() {
        let mut store = CacheStore::new();

        store.set("trending:topics".to_string(), json!([]), Duration::from_secs(300)).unwrap();

        let remaining = store.ttl_remaining("trending:topics").unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(300));
        assert!(remaining > Duration::from_secs(299));
        assert_eq!(store.ttl_remaining("missing").unwrap(), None);
    }

    #[test]
    fn test_store_increment_fixed_window() {
        let mut store = CacheStore::new();

        assert_eq!(store.increment("rate:ip1", MINUTE).unwrap(), 1);
        let first_deadline = store.entries["rate:ip1"].expires_at;

        sleep(Duration::from_millis(5));
        assert_eq!(store.increment("rate:ip1", MINUTE).unwrap(), 2);

        assert_eq!(store.entries["rate:ip1"].expires_at, first_deadline);
    }

    #[test]
    fn test_store_increment_restarts_after_window() {
        let mut store = CacheStore::new();

        store.increment("rate:ip1", Duration::from_millis(5)).unwrap();
        store.increment("rate:ip1", Duration::from_millis(5)).unwrap();
        sleep(Duration::from_millis(20));

        assert_eq!(store.increment("rate:ip1", Duration::from_millis(5)).unwrap(), 1);
    }

    #[test]
    fn test_store_increment_non_integer() {
        let mut store = CacheStore::new();

        store.set("session:abc".to_string(), json!({"user_id": 1}), MINUTE).unwrap();

        let result = store.increment("session:abc", MINUTE);
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert_eq!(store.get("session:abc").unwrap(), Some(json!({"user_id": 1})));
    }

    #[test]
    fn test_store_increment_zero_window() {
        let mut store = CacheStore::new();
        assert!(matches!(
            store.increment("rate:ip1", Duration::ZERO),
            Err(CacheError::InvalidTtl)
        ));
    }

    #[test]
    fn test_store_unrepresentable_ttl_rejected() {
        let mut store = CacheStore::new();

        assert!(matches!(
            store.set("k".to_string(), json!(1), Duration::MAX),
            Err(CacheError::InvalidTtl)
        ));
        assert!(matches!(
            store.increment("rate:x", Duration::from_secs(u64::MAX)),
            Err(CacheError::InvalidTtl)
        ));
        assert!(store.is_empty());

        // A long but representable TTL is still accepted.
        let year = Duration::from_secs(365 * 24 * 3600);
        store.set("k".to_string(), json!(1), year).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_store_delete_expired_counts_expiration() {
        let mut store = CacheStore::new();

        store.set("key1".to_string(), json!("value1"), Duration::from_millis(1)).unwrap();
        sleep(Duration::from_millis(20));

        assert!(!store.delete("key1").unwrap());
        assert!(store.is_empty());

        let stats = store.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.invalidations, 0);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new();

        store.set("key1".to_string(), json!("value1"), MINUTE).unwrap();
        store.get("key1").unwrap(); // hit
        store.get("nonexistent").unwrap(); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_remove_if_expired() {
        let mut store = CacheStore::new();

        store.set("old".to_string(), json!(1), Duration::from_millis(1)).unwrap();
        store.set("fresh".to_string(), json!(2), MINUTE).unwrap();
        sleep(Duration::from_millis(20));

        assert_eq!(store.expired_keys(), vec!["old".to_string()]);

        // Re-set between listing and removal: the new entry must survive.
        store.set("old".to_string(), json!(3), MINUTE).unwrap();
        assert!(!store.remove_if_expired("old"));
        assert!(!store.remove_if_expired("fresh"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_key_validation() {
        let mut store = CacheStore::new();
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        assert!(matches!(
            store.set(long_key, json!("value"), MINUTE),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(matches!(store.get(""), Err(CacheError::InvalidArgument(_))));
        assert!(matches!(store.delete(""), Err(CacheError::InvalidArgument(_))));
    }

    #[test]
    fn test_store_clear() {
        let mut store = CacheStore::new();

        store.set("a".to_string(), json!(1), MINUTE).unwrap();
        store.set("b".to_string(), json!(2), MINUTE).unwrap();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.stats().total_entries, 0);
    }
}
