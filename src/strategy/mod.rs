//! Caching Strategies
//!
//! Cache-aside and write-through layered over a [`SharedStore`](crate::cache::SharedStore)
//! and a caller-supplied source of truth.

mod cache_aside;
mod source;
mod write_through;

pub use cache_aside::{CacheAside, Lookup};
pub use source::{Loader, Writer};
pub use write_through::WriteThrough;
