#![deny(dead_code)]
#![deny(unused_variables)]

pub mod bounded;
pub mod dictionaries;
pub mod stat_cache;

pub use bounded::BoundedCache;
pub use dictionaries::DictionaryStore;
pub use stat_cache::{is_insufficient, CacheEntry, Partition, StatCache, StoreOutcome};
