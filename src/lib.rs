//! Cache Layer - An in-memory TTL cache with caching strategies
//!
//! Provides a lazily-expiring key-value store with glob invalidation, the
//! cache-aside and write-through strategies over a caller-supplied source of
//! truth, and a fixed-window rate limiter built on the same store.

pub mod cache;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod strategy;
pub mod tasks;

pub use cache::{CacheStats, CacheStore, KeyPattern, SharedStore};
pub use config::Config;
pub use error::{CacheError, Result};
pub use rate_limit::{RateDecision, RateLimiter};
pub use strategy::{CacheAside, Loader, Lookup, WriteThrough, Writer};
pub use tasks::spawn_sweep_task;
