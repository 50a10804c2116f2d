//! Caching of ranked results.
//!
//! Ranked station lists are cached per quantized coordinate, so small GPS
//! jitter hits the same entry. Entries live in a string-keyed,
//! string-valued store as JSON, which lets the sled-backed store survive
//! restarts. Expiry is lazy: an expired entry is removed the next time
//! it is read, or by an explicit sweep.

mod clock;
mod error;
mod ranking;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheMiss, StoreError};
pub use ranking::{CacheConfig, CacheEntry, CacheHit, RankingCache};
pub use store::{FileStore, KeyValueStore, MemoryStore};
