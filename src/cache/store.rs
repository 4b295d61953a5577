//! Snapshot cache with TTL and explicit invalidation.
//!
//! One record lives under [`CACHE_STORAGE_KEY`]. It is always replaced or
//! removed whole, never patched. Storage failures are logged and absorbed:
//! reads degrade to a miss and writes to a no-op.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::ConfigSnapshot;

use super::clock::{Clock, SystemClock, unix_millis, unix_millis_ceil};
use super::config::{CacheConfig, StorageKind};
use super::storage::{DisabledStorage, FileStorage, MemoryStorage, SessionStorage};

/// Fixed storage key of the cache record.
pub const CACHE_STORAGE_KEY: &str = "placard.ui_config";

pub(crate) const METRIC_CACHE_HIT: &str = "placard_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "placard_cache_miss_total";
pub(crate) const METRIC_CACHE_STORAGE_ERROR: &str = "placard_cache_storage_error_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "placard_cache_invalidate_total";

/// Persisted shape: `{ "fetched_at": <epoch ms>, "snapshot": {...} }`.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    fetched_at: i64,
    snapshot: ConfigSnapshot,
}

/// Session-scoped cache of the full config snapshot.
pub struct ConfigCache {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ConfigCache {
    pub fn new(storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            storage,
            clock,
            ttl,
        }
    }

    /// Build a cache on the configured backend with the system clock.
    pub fn from_config(config: &CacheConfig) -> Self {
        let storage: Arc<dyn SessionStorage> = match config.storage {
            StorageKind::Memory => Arc::new(MemoryStorage::new()),
            StorageKind::File => Arc::new(FileStorage::new(config.directory.clone())),
            StorageKind::Disabled => Arc::new(DisabledStorage),
        };
        Self::new(storage, Arc::new(SystemClock), config.ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached snapshot if one exists and is younger than the TTL.
    pub async fn get(&self) -> Option<ConfigSnapshot> {
        let raw = match self.storage.get_item(CACHE_STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS).increment(1);
                debug!(reason = "empty", "Config cache miss");
                return None;
            }
            Err(err) => {
                counter!(METRIC_CACHE_STORAGE_ERROR).increment(1);
                counter!(METRIC_CACHE_MISS).increment(1);
                warn!(op = "get", error = %err, "Config cache storage failed; treating as miss");
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                counter!(METRIC_CACHE_MISS).increment(1);
                warn!(error = %err, "Config cache record is unreadable; treating as miss");
                return None;
            }
        };

        // Millisecond stamps: a fresh entry is never dropped early, though one may
        // be served for under a millisecond past its TTL.
        let now = unix_millis(self.clock.now());
        let age_ms = i128::from(now) - i128::from(record.fetched_at);
        let ttl_ms = i128::try_from(self.ttl.as_millis()).unwrap_or(i128::MAX);
        if age_ms >= ttl_ms {
            counter!(METRIC_CACHE_MISS).increment(1);
            debug!(reason = "expired", age_ms = %age_ms, "Config cache miss");
            return None;
        }

        counter!(METRIC_CACHE_HIT).increment(1);
        debug!(age_ms = %age_ms, keys = record.snapshot.len(), "Config cache hit");
        Some(record.snapshot)
    }

    /// Store `snapshot` stamped with the current time, replacing any entry.
    pub async fn put(&self, snapshot: &ConfigSnapshot) {
        let record = CacheRecord {
            fetched_at: unix_millis_ceil(self.clock.now()),
            snapshot: snapshot.clone(),
        };

        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "Config cache record could not be encoded");
                return;
            }
        };

        if let Err(err) = self.storage.set_item(CACHE_STORAGE_KEY, &raw).await {
            counter!(METRIC_CACHE_STORAGE_ERROR).increment(1);
            warn!(op = "put", error = %err, "Config cache storage failed; snapshot not cached");
        }
    }

    /// Drop the cached snapshot regardless of its age.
    pub async fn invalidate(&self) {
        counter!(METRIC_CACHE_INVALIDATE).increment(1);
        match self.storage.remove_item(CACHE_STORAGE_KEY).await {
            Ok(()) => debug!("Config cache invalidated"),
            Err(err) => {
                counter!(METRIC_CACHE_STORAGE_ERROR).increment(1);
                warn!(op = "invalidate", error = %err, "Config cache storage failed; entry may linger until TTL");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::storage::StorageError;

    fn snapshot(pairs: &[(&str, &str)]) -> ConfigSnapshot {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), Some(value.to_string())))
            .collect()
    }

    fn cache_with(storage: Arc<dyn SessionStorage>) -> (ConfigCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(datetime!(2024-03-01 09:00 UTC)));
        let cache = ConfigCache::new(storage, clock.clone(), Duration::from_millis(60_000));
        (cache, clock)
    }

    #[tokio::test]
    async fn serves_snapshot_until_ttl_boundary() {
        let (cache, clock) = cache_with(Arc::new(MemoryStorage::new()));
        let cached = snapshot(&[("greeting", "Hi")]);
        cache.put(&cached).await;

        clock.advance(time::Duration::milliseconds(59_999));
        assert_eq!(cache.get().await, Some(cached));

        clock.advance(time::Duration::milliseconds(1));
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn sub_millisecond_write_time_stays_fresh_until_ttl() {
        let (cache, clock) = cache_with(Arc::new(MemoryStorage::new()));
        clock.set(datetime!(2024-03-01 09:00:00.0009 UTC));
        let cached = snapshot(&[("greeting", "Hi")]);
        cache.put(&cached).await;

        clock.advance(time::Duration::microseconds(59_999_600));
        assert_eq!(cache.get().await, Some(cached));

        clock.advance(time::Duration::milliseconds(2));
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn put_replaces_previous_entry_and_restarts_ttl() {
        let (cache, clock) = cache_with(Arc::new(MemoryStorage::new()));
        cache.put(&snapshot(&[("greeting", "Hi")])).await;

        clock.advance(time::Duration::seconds(45));
        let replacement = snapshot(&[("footer_text", "© 2024")]);
        cache.put(&replacement).await;

        clock.advance(time::Duration::seconds(45));
        let current = cache.get().await.expect("fresh entry");
        assert_eq!(current, replacement);
        assert!(!current.contains_key("greeting"));
    }

    #[tokio::test]
    async fn invalidate_removes_fresh_entry() {
        let storage = Arc::new(MemoryStorage::new());
        let (cache, _clock) = cache_with(storage.clone());
        cache.put(&snapshot(&[("greeting", "Hi")])).await;

        cache.invalidate().await;

        assert_eq!(cache.get().await, None);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn persisted_record_uses_epoch_millis() {
        let storage = Arc::new(MemoryStorage::new());
        let (cache, _clock) = cache_with(storage.clone());
        cache.put(&snapshot(&[("greeting", "Hi")])).await;

        let raw = storage
            .get_item(CACHE_STORAGE_KEY)
            .await
            .expect("read")
            .expect("record present");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["fetched_at"], 1_709_283_600_000_i64);
        assert_eq!(value["snapshot"]["greeting"], "Hi");
    }

    #[tokio::test]
    async fn corrupt_record_reads_as_miss() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(CACHE_STORAGE_KEY, "{not json")
            .await
            .expect("seed");
        let (cache, _clock) = cache_with(storage);

        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn disabled_storage_never_raises() {
        let (cache, _clock) = cache_with(Arc::new(DisabledStorage));

        cache.put(&snapshot(&[("greeting", "Hi")])).await;
        assert_eq!(cache.get().await, None);
        cache.invalidate().await;
    }

    #[tokio::test]
    async fn quota_failure_leaves_cache_empty() {
        let (cache, _clock) = cache_with(Arc::new(MemoryStorage::with_quota(16)));

        cache
            .put(&snapshot(&[("hero_html", "<section>a long hero block</section>")]))
            .await;

        assert_eq!(cache.get().await, None);
    }

    struct FlakyReads;

    #[async_trait::async_trait]
    impl SessionStorage for FlakyReads {
        async fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("read failed")))
        }

        async fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn read_errors_read_as_miss() {
        let (cache, _clock) = cache_with(Arc::new(FlakyReads));
        cache.put(&snapshot(&[("greeting", "Hi")])).await;
        assert_eq!(cache.get().await, None);
    }

    #[test]
    fn from_config_honours_storage_kind() {
        let config = CacheConfig {
            storage: StorageKind::Memory,
            ttl: Duration::from_secs(5),
            ..Default::default()
        };
        let cache = ConfigCache::from_config(&config);
        assert_eq!(cache.ttl(), Duration::from_secs(5));
    }
}
