//! Summary caching

pub mod store;
pub mod summary_cache;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use summary_cache::{CacheEntry, CacheKey, FRESHNESS_WINDOW, SummaryCache};
