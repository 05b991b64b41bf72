//! Background Tasks Module
//!
//! Contains background tasks that may run alongside the cache.
//!
//! # Tasks
//! - Expiry sweep: reaps entries whose TTL elapsed but were never read again

mod sweep;

pub use sweep::{spawn_sweep_task, sweep_expired};
