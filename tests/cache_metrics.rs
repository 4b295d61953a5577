use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use placard::application::{
    ApplicationMode, ConfigApplier, ConfigLoader, DisplaySink, DisplayTarget, SnapshotSource,
    StoreError,
};
use placard::cache::{ConfigCache, DisabledStorage, ManualClock, MemoryStorage};
use placard::domain::ConfigSnapshot;

struct FixedSource(Option<ConfigSnapshot>);

#[async_trait]
impl SnapshotSource for FixedSource {
    async fn fetch_snapshot(&self) -> Result<ConfigSnapshot, StoreError> {
        self.0
            .clone()
            .ok_or_else(|| StoreError::transport("connection refused"))
    }
}

/// Sink that cannot render anything.
struct Detached;

impl DisplaySink for Detached {}

fn snapshot() -> ConfigSnapshot {
    [("greeting".to_string(), Some("Hi".to_string()))]
        .into_iter()
        .collect()
}

#[tokio::test]
async fn cache_and_loader_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let ttl = Duration::from_millis(60_000);
    let clock = Arc::new(ManualClock::default());

    // Miss then hit, plus an invalidation, on working storage.
    let cache = Arc::new(ConfigCache::new(
        Arc::new(MemoryStorage::new()),
        clock.clone(),
        ttl,
    ));
    let applier = Arc::new(ConfigApplier::new());
    applier.register(DisplayTarget::new(
        "greeting",
        ApplicationMode::Image,
        Detached,
    ));
    let loader = ConfigLoader::new(
        cache.clone(),
        Arc::new(FixedSource(Some(snapshot()))),
        applier,
    );
    assert!(loader.load().await.is_fetched());
    assert!(loader.load().await.is_cached());
    cache.invalidate().await;

    // Storage errors on disabled storage.
    let disabled = ConfigCache::new(Arc::new(DisabledStorage), clock.clone(), ttl);
    disabled.put(&snapshot()).await;
    assert!(disabled.get().await.is_none());

    // Fetch failure.
    let failing = ConfigLoader::new(
        Arc::new(ConfigCache::new(Arc::new(MemoryStorage::new()), clock, ttl)),
        Arc::new(FixedSource(None)),
        Arc::new(ConfigApplier::new()),
    );
    assert!(failing.load().await.is_failed());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "placard_cache_hit_total",
        "placard_cache_miss_total",
        "placard_cache_storage_error_total",
        "placard_cache_invalidate_total",
        "placard_fetch_failure_total",
        "placard_apply_target_failure_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
