//! Cache-then-fetch loading of the UI config snapshot.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::application::applier::{ApplySummary, ConfigApplier};
use crate::application::repos::SnapshotSource;
use crate::cache::ConfigCache;
use crate::domain::ConfigSnapshot;

pub(crate) const METRIC_FETCH_FAILURE: &str = "placard_fetch_failure_total";

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Result of one `load()` call.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Cached {
        snapshot: ConfigSnapshot,
        summary: ApplySummary,
    },
    Fetched {
        snapshot: ConfigSnapshot,
        summary: ApplySummary,
    },
    /// Nothing was applied; existing content stays as it was.
    Failed { reason: String },
}

impl LoadOutcome {
    pub fn snapshot(&self) -> Option<&ConfigSnapshot> {
        match self {
            LoadOutcome::Cached { snapshot, .. } | LoadOutcome::Fetched { snapshot, .. } => {
                Some(snapshot)
            }
            LoadOutcome::Failed { .. } => None,
        }
    }

    pub fn into_snapshot(self) -> Option<ConfigSnapshot> {
        match self {
            LoadOutcome::Cached { snapshot, .. } | LoadOutcome::Fetched { snapshot, .. } => {
                Some(snapshot)
            }
            LoadOutcome::Failed { .. } => None,
        }
    }

    pub fn summary(&self) -> Option<ApplySummary> {
        match self {
            LoadOutcome::Cached { summary, .. } | LoadOutcome::Fetched { summary, .. } => {
                Some(*summary)
            }
            LoadOutcome::Failed { .. } => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, LoadOutcome::Cached { .. })
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, LoadOutcome::Fetched { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadOutcome::Failed { .. })
    }
}

/// Loads the snapshot through the cache and applies it to registered targets.
pub struct ConfigLoader {
    cache: Arc<ConfigCache>,
    source: Arc<dyn SnapshotSource>,
    applier: Arc<ConfigApplier>,
    events: broadcast::Sender<ConfigSnapshot>,
}

impl ConfigLoader {
    pub fn new(
        cache: Arc<ConfigCache>,
        source: Arc<dyn SnapshotSource>,
        applier: Arc<ConfigApplier>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            cache,
            source,
            applier,
            events,
        }
    }

    pub fn applier(&self) -> &Arc<ConfigApplier> {
        &self.applier
    }

    /// Independent receiver of every successfully loaded snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigSnapshot> {
        self.events.subscribe()
    }

    pub async fn load(&self) -> LoadOutcome {
        if let Some(snapshot) = self.cache.get().await {
            let summary = self.apply_and_announce(&snapshot);
            debug!(keys = snapshot.len(), "Served UI config from cache");
            return LoadOutcome::Cached { snapshot, summary };
        }

        let snapshot = match self.source.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                counter!(METRIC_FETCH_FAILURE).increment(1);
                warn!(error = %err, "UI config fetch failed; keeping existing content");
                return LoadOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        // Cache before applying so applied content never runs ahead of the cache.
        self.cache.put(&snapshot).await;
        let summary = self.apply_and_announce(&snapshot);
        info!(
            keys = snapshot.len(),
            applied = summary.applied,
            "Fetched UI config"
        );
        LoadOutcome::Fetched { snapshot, summary }
    }

    /// Drop the cached snapshot and load again.
    pub async fn refresh(&self) -> LoadOutcome {
        self.cache.invalidate().await;
        self.load().await
    }

    fn apply_and_announce(&self, snapshot: &ConfigSnapshot) -> ApplySummary {
        let summary = self.applier.apply(snapshot);
        let listeners = self.events.receiver_count();
        if self.events.send(snapshot.clone()).is_err() {
            debug!("No listeners for config loaded event");
        } else {
            debug!(listeners, "Broadcast config loaded event");
        }
        summary
    }
}
