//! Cache of ranked station lists keyed by quantized coordinate.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{CACHE_KEY_PREFIX, Coordinate, RankedStation};

use super::clock::{Clock, SystemClock};
use super::error::{CacheMiss, StoreError};
use super::store::{KeyValueStore, MemoryStore};

/// Configuration for the ranking cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a ranked result stays valid.
    pub ttl: Duration,

    /// Decimal places kept when quantizing coordinates into keys.
    pub precision: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            precision: 3,
        }
    }
}

/// A stored ranking with the time it was stored.
///
/// Entries are replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at: DateTime<Utc>,
    pub stations: Vec<RankedStation>,
}

impl CacheEntry {
    /// Whether the entry is still valid at `now`.
    ///
    /// An entry stamped in the future (clock moved back) counts as age zero.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = (now - self.stored_at).to_std().unwrap_or_default();
        age < ttl
    }
}

/// A fresh cached ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    pub stations: Vec<RankedStation>,
    pub stored_at: DateTime<Utc>,
}

/// Ranked results cached per quantized coordinate.
///
/// Cheap to clone; clones share the same store. All store access goes
/// through one async mutex, so each `get` (including its lazy eviction)
/// and each `put` is atomic with respect to the others.
#[derive(Clone)]
pub struct RankingCache {
    store: Arc<Mutex<Box<dyn KeyValueStore>>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    precision: u32,
}

impl RankingCache {
    /// Create a cache over the given store.
    pub fn new(store: impl KeyValueStore + 'static, config: &CacheConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
            clock: Arc::new(SystemClock),
            ttl: config.ttl,
            precision: config.precision,
        }
    }

    /// Create a cache that lives only in memory.
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::new(MemoryStore::new(), config)
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the cache TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(&self, coordinate: Coordinate) -> String {
        coordinate.quantize(self.precision).cache_key()
    }

    /// Look up a fresh ranking for the bucket containing `coordinate`.
    ///
    /// Expired or unreadable entries are removed and reported as a miss.
    pub async fn get(&self, coordinate: Coordinate) -> Result<CacheHit, CacheMiss> {
        let key = self.key(coordinate);
        let mut store = self.store.lock().await;

        let raw = match store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(CacheMiss),
            Err(e) => {
                warn!(%key, error = %e, "failed to read cache entry");
                return Err(CacheMiss);
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%key, error = %e, "discarding unreadable cache entry");
                if let Err(e) = store.remove(&key) {
                    warn!(%key, error = %e, "failed to remove unreadable cache entry");
                }
                return Err(CacheMiss);
            }
        };

        if !entry.is_fresh(self.clock.now(), self.ttl) {
            debug!(%key, stored_at = %entry.stored_at, "evicting expired cache entry");
            if let Err(e) = store.remove(&key) {
                warn!(%key, error = %e, "failed to evict expired cache entry");
            }
            return Err(CacheMiss);
        }

        Ok(CacheHit {
            stations: entry.stations,
            stored_at: entry.stored_at,
        })
    }

    /// Store a ranking for the bucket containing `coordinate`.
    ///
    /// Any previous entry for the bucket is overwritten.
    pub async fn put(
        &self,
        coordinate: Coordinate,
        stations: Vec<RankedStation>,
    ) -> Result<(), StoreError> {
        let key = self.key(coordinate);
        let entry = CacheEntry {
            stored_at: self.clock.now(),
            stations,
        };
        let json = serde_json::to_string(&entry)?;

        let mut store = self.store.lock().await;
        store.set(&key, json)
    }

    /// Remove the entry for the bucket containing `coordinate`.
    pub async fn remove(&self, coordinate: Coordinate) -> Result<bool, StoreError> {
        let key = self.key(coordinate);
        let mut store = self.store.lock().await;
        store.remove(&key)
    }

    /// Remove every expired or unreadable entry.
    ///
    /// Returns the number of entries removed. Keys outside the cache's
    /// prefix are left alone.
    pub async fn evict_expired(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut store = self.store.lock().await;

        let mut stale = Vec::new();
        for key in store.keys()? {
            if !key.starts_with(CACHE_KEY_PREFIX) {
                continue;
            }
            let fresh = store
                .get(&key)?
                .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
                .is_some_and(|entry| entry.is_fresh(now, self.ttl));
            if !fresh {
                stale.push(key);
            }
        }

        for key in &stale {
            store.remove(key)?;
        }

        if !stale.is_empty() {
            debug!(removed = stale.len(), "evicted expired cache entries");
        }

        Ok(stale.len())
    }

    /// Number of entries in the store, fresh or not.
    pub async fn entry_count(&self) -> Result<usize, StoreError> {
        let store = self.store.lock().await;
        Ok(store
            .keys()?
            .iter()
            .filter(|k| k.starts_with(CACHE_KEY_PREFIX))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileStore, ManualClock};
    use crate::domain::{Station, StationId};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn ranking() -> Vec<RankedStation> {
        vec![
            RankedStation::with_distance(
                Station::new(StationId::new("A"), "A", coord(31.95, 35.91)).unwrap(),
                0.0,
            ),
            RankedStation::from_upstream(
                Station::new(StationId::new("B"), "B", coord(32.00, 35.95)).unwrap(),
                Some(6.719),
                Some(14.0),
            ),
        ]
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 3, 10, 0, 0).unwrap())
    }

    fn cache_with(clock: &ManualClock) -> RankingCache {
        RankingCache::in_memory(&CacheConfig::default()).with_clock(Arc::new(clock.clone()))
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let clock = clock();
        let cache = cache_with(&clock);
        let here = coord(31.95, 35.91);

        cache.put(here, ranking()).await.unwrap();
        let hit = cache.get(here).await.unwrap();

        assert_eq!(hit.stations, ranking());
        assert_eq!(hit.stored_at, clock.now());
    }

    #[tokio::test]
    async fn nearby_coordinate_in_same_bucket_hits() {
        let cache = cache_with(&clock());
        cache.put(coord(31.9501, 35.9104), ranking()).await.unwrap();

        let hit = cache.get(coord(31.9498, 35.9099)).await.unwrap();
        assert_eq!(hit.stations, ranking());
    }

    #[tokio::test]
    async fn different_bucket_misses() {
        let cache = cache_with(&clock());
        cache.put(coord(31.95, 35.91), ranking()).await.unwrap();

        assert_eq!(cache.get(coord(31.96, 35.91)).await, Err(CacheMiss));
    }

    #[tokio::test]
    async fn empty_cache_misses() {
        let cache = cache_with(&clock());
        assert_eq!(cache.get(coord(0.0, 0.0)).await, Err(CacheMiss));
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let clock = clock();
        let cache = cache_with(&clock);
        let here = coord(31.95, 35.91);
        cache.put(here, ranking()).await.unwrap();

        clock.advance(chrono::Duration::minutes(14));
        assert!(cache.get(here).await.is_ok());

        clock.advance(chrono::Duration::minutes(1));
        assert_eq!(cache.get(here).await, Err(CacheMiss));

        // Lazily evicted on that read.
        assert_eq!(cache.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn put_overwrites_and_restamps() {
        let clock = clock();
        let cache = cache_with(&clock);
        let here = coord(31.95, 35.91);
        cache.put(here, ranking()).await.unwrap();

        clock.advance(chrono::Duration::minutes(10));
        let newer = ranking()[..1].to_vec();
        cache.put(here, newer.clone()).await.unwrap();

        clock.advance(chrono::Duration::minutes(10));
        let hit = cache.get(here).await.unwrap();
        assert_eq!(hit.stations, newer);
    }

    #[tokio::test]
    async fn remove_entry() {
        let cache = cache_with(&clock());
        let here = coord(31.95, 35.91);
        cache.put(here, ranking()).await.unwrap();

        assert!(cache.remove(here).await.unwrap());
        assert!(!cache.remove(here).await.unwrap());
        assert_eq!(cache.get(here).await, Err(CacheMiss));
    }

    #[tokio::test]
    async fn evict_expired_is_idempotent() {
        let clock = clock();
        let cache = cache_with(&clock);
        cache.put(coord(31.95, 35.91), ranking()).await.unwrap();

        clock.advance(chrono::Duration::minutes(10));
        cache.put(coord(32.05, 36.09), ranking()).await.unwrap();

        clock.advance(chrono::Duration::minutes(6));
        assert_eq!(cache.evict_expired().await.unwrap(), 1);
        assert_eq!(cache.evict_expired().await.unwrap(), 0);
        assert_eq!(cache.entry_count().await.unwrap(), 1);
        assert!(cache.get(coord(32.05, 36.09)).await.is_ok());
    }

    #[tokio::test]
    async fn unreadable_entry_is_a_miss_and_removed() {
        let mut store = MemoryStore::new();
        let here = coord(31.95, 35.91);
        store
            .set(&here.quantize(3).cache_key(), "{broken".to_string())
            .unwrap();
        store.set("unrelated", "keep me".to_string()).unwrap();

        let cache = RankingCache::new(store, &CacheConfig::default());
        assert_eq!(cache.get(here).await, Err(CacheMiss));
        assert_eq!(cache.entry_count().await.unwrap(), 0);
        assert_eq!(cache.evict_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rankings");
        let clock = clock();
        let here = coord(31.95, 35.91);

        let cache = RankingCache::new(FileStore::open(&path).unwrap(), &CacheConfig::default())
            .with_clock(Arc::new(clock.clone()));
        cache.put(here, ranking()).await.unwrap();
        drop(cache);

        let reopened =
            RankingCache::new(FileStore::open(&path).unwrap(), &CacheConfig::default())
                .with_clock(Arc::new(clock.clone()));
        assert_eq!(reopened.get(here).await.unwrap().stations, ranking());
    }

    /// A store that refuses every write.
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Database(sled::Error::Unsupported(
                "read-only".to_string(),
            )))
        }

        fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
            self.0.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.0.keys()
        }
    }

    #[tokio::test]
    async fn failed_put_leaves_nothing_readable() {
        let cache = RankingCache::new(ReadOnlyStore(MemoryStore::new()), &CacheConfig::default());
        let here = coord(31.95, 35.91);

        assert!(matches!(
            cache.put(here, ranking()).await,
            Err(StoreError::Database(_))
        ));
        assert_eq!(cache.get(here).await, Err(CacheMiss));
        assert_eq!(cache.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn durable_entries_match_what_was_acknowledged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rankings");
        let here = coord(31.95, 35.91);
        let there = coord(32.05, 36.09);

        let cache = RankingCache::new(FileStore::open(&path).unwrap(), &CacheConfig::default());
        cache.put(here, ranking()).await.unwrap();
        cache.put(there, ranking()).await.unwrap();
        assert!(cache.remove(there).await.unwrap());
        let live = cache.entry_count().await.unwrap();
        drop(cache);

        let reopened = RankingCache::new(FileStore::open(&path).unwrap(), &CacheConfig::default());
        assert_eq!(reopened.entry_count().await.unwrap(), live);
        assert!(reopened.get(here).await.is_ok());
        assert_eq!(reopened.get(there).await, Err(CacheMiss));
    }

    #[test]
    fn future_entries_count_as_fresh() {
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 10, 0, 0).unwrap();
        let entry = CacheEntry {
            stored_at: now + chrono::Duration::minutes(5),
            stations: Vec::new(),
        };
        assert!(entry.is_fresh(now, Duration::from_secs(60)));
        assert!(!entry.is_fresh(now + chrono::Duration::minutes(6), Duration::from_secs(60)));
    }
}
