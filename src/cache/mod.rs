//! Persistent read-through cache for remote resources.

pub mod entry;
pub mod store;

pub use entry::{CacheEntry, CacheKey, namespace};
pub use store::{CacheFlushGuard, ResourceCache};
