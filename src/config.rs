//! Configuration Module
//!
//! Loads the demo binary's settings from environment variables. The library
//! itself takes every TTL and limit per call and reads no global config.

use std::env;
use std::time::Duration;

/// Demo configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Expiry sweep interval in seconds
    pub sweep_interval: u64,
    /// TTL in seconds for single-product entries
    pub product_ttl: u64,
    /// TTL in seconds for list and aggregate entries
    pub list_ttl: u64,
    /// Requests allowed per rate-limit window
    pub rate_limit: u64,
    /// Rate-limit window length in seconds
    pub rate_window: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    /// - `PRODUCT_TTL` - Product entry TTL in seconds (default: 3600)
    /// - `LIST_TTL` - List entry TTL in seconds (default: 300)
    /// - `RATE_LIMIT` - Requests per window (default: 10)
    /// - `RATE_WINDOW` - Window length in seconds (default: 60)
    ///
    /// Missing, unparseable or zero values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sweep_interval: env_u64("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            product_ttl: env_u64("PRODUCT_TTL").unwrap_or(defaults.product_ttl),
            list_ttl: env_u64("LIST_TTL").unwrap_or(defaults.list_ttl),
            rate_limit: env_u64("RATE_LIMIT").unwrap_or(defaults.rate_limit),
            rate_window: env_u64("RATE_WINDOW").unwrap_or(defaults.rate_window),
        }
    }

    // == Durations ==
    /// Interval between expiry sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    /// TTL for single-product entries.
    pub fn product_ttl(&self) -> Duration {
        Duration::from_secs(self.product_ttl)
    }

    /// TTL for list pages.
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl)
    }

    /// Length of one rate-limit window.
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep_interval: 1,
            product_ttl: 3600,
            list_ttl: 300,
            rate_limit: 10,
            rate_window: 60,
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
}
