//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and glob invalidation.

mod entry;
mod pattern;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{ceil_secs, CacheEntry};
pub use pattern::KeyPattern;
pub use shared::SharedStore;
pub use stats::CacheStats;
pub use store::{validate_key, validate_ttl, CacheStore};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
