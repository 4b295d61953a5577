//! Admin editing surface: uncached listing and cache-invalidating writes.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::application::notify::{Notice, Notifier};
use crate::application::repos::{AssetStore, StoreError, WriteAck};
use crate::cache::ConfigCache;
use crate::domain::{AssetUpdate, SectionGroups};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("asset store rejected the update: {message}")]
    Rejected { message: String },
    #[error("asset store request failed")]
    Store(#[source] StoreError),
}

impl From<StoreError> for EditorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected { message } => EditorError::Rejected { message },
            other => EditorError::Store(other),
        }
    }
}

/// Returned by a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub updated: usize,
    pub message: Option<String>,
}

impl From<WriteAck> for SaveReceipt {
    fn from(ack: WriteAck) -> Self {
        Self {
            updated: ack.updated,
            message: ack.message,
        }
    }
}

pub struct AdminEditor {
    store: Arc<dyn AssetStore>,
    cache: Arc<ConfigCache>,
    notifier: Arc<dyn Notifier>,
}

impl AdminEditor {
    pub fn new(
        store: Arc<dyn AssetStore>,
        cache: Arc<ConfigCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            cache,
            notifier,
        }
    }

    /// Fresh listing grouped by section; never served from the cache.
    pub async fn list_grouped(&self) -> Result<SectionGroups, EditorError> {
        let assets = self.store.list_assets().await?;
        Ok(SectionGroups::from_assets(assets))
    }

    pub async fn save_one(&self, key: &str, value: &str) -> Result<SaveReceipt, EditorError> {
        let result = self.store.update_asset(key, value).await;
        match self.settle(result).await {
            Ok(receipt) => {
                info!(key, "Saved UI asset");
                self.notifier
                    .notify(Notice::success(format!("Saved “{key}”.")));
                Ok(receipt)
            }
            Err(err) => {
                debug!(key, error = %err, "UI asset save failed");
                self.notifier
                    .notify(Notice::error(failure_text(&err, "Save failed")));
                Err(err)
            }
        }
    }

    /// One batch write. An empty batch is still sent.
    pub async fn save_many(&self, updates: &[AssetUpdate]) -> Result<SaveReceipt, EditorError> {
        let result = self.store.update_assets(updates).await;
        match self.settle(result).await {
            Ok(receipt) => {
                info!(
                    requested = updates.len(),
                    updated = receipt.updated,
                    "Saved UI asset batch"
                );
                self.notifier.notify(Notice::success(format!(
                    "Saved {} {}.",
                    receipt.updated,
                    if receipt.updated == 1 { "asset" } else { "assets" }
                )));
                Ok(receipt)
            }
            Err(err) => {
                debug!(requested = updates.len(), error = %err, "UI asset batch save failed");
                self.notifier
                    .notify(Notice::error(failure_text(&err, "Batch save failed")));
                Err(err)
            }
        }
    }

    /// Invalidate only when the store accepted the write.
    async fn settle(
        &self,
        result: Result<WriteAck, StoreError>,
    ) -> Result<SaveReceipt, EditorError> {
        let ack = result?;
        self.cache.invalidate().await;
        Ok(ack.into())
    }
}

fn failure_text(err: &EditorError, prefix: &str) -> String {
    match err {
        EditorError::Rejected { message } => format!("{prefix}: {message}"),
        EditorError::Store(inner) => format!("{prefix}: {inner}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::application::notify::{NoticeKind, NoticeLog};
    use crate::cache::{ManualClock, MemoryStorage, SessionStorage, StorageError};
    use crate::domain::{Asset, AssetType, ConfigSnapshot};

    #[derive(Default)]
    struct FakeStore {
        assets: Vec<Asset>,
        fail_with: Mutex<Option<StoreError>>,
        batches: Mutex<Vec<Vec<AssetUpdate>>>,
        singles: Mutex<Vec<(String, String)>>,
    }

    impl FakeStore {
        fn failing(err: StoreError) -> Self {
            Self {
                fail_with: Mutex::new(Some(err)),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl AssetStore for FakeStore {
        async fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
            Ok(self.assets.clone())
        }

        async fn update_asset(&self, key: &str, value: &str) -> Result<WriteAck, StoreError> {
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            self.singles
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
            Ok(WriteAck {
                updated: 1,
                message: None,
            })
        }

        async fn update_assets(&self, updates: &[AssetUpdate]) -> Result<WriteAck, StoreError> {
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            self.batches.lock().unwrap().push(updates.to_vec());
            Ok(WriteAck {
                updated: updates.len(),
                message: Some("Updated".to_string()),
            })
        }
    }

    /// Memory storage that counts removals of the cache key.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        removals: Mutex<usize>,
    }

    #[async_trait]
    impl SessionStorage for CountingStorage {
        async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            *self.removals.lock().unwrap() += 1;
            self.inner.remove_item(key).await
        }
    }

    struct Harness {
        editor: AdminEditor,
        store: Arc<FakeStore>,
        cache: Arc<ConfigCache>,
        storage: Arc<CountingStorage>,
        notices: Arc<NoticeLog>,
    }

    fn harness(store: FakeStore) -> Harness {
        let store = Arc::new(store);
        let storage = Arc::new(CountingStorage::default());
        let cache = Arc::new(ConfigCache::new(
            storage.clone(),
            Arc::new(ManualClock::default()),
            Duration::from_millis(60_000),
        ));
        let notices = Arc::new(NoticeLog::new());
        let editor = AdminEditor::new(store.clone(), cache.clone(), notices.clone());
        Harness {
            editor,
            store,
            cache,
            storage,
            notices,
        }
    }

    fn cached() -> ConfigSnapshot {
        [("footer_text".to_string(), Some("old".to_string()))]
            .into_iter()
            .collect()
    }

    fn asset(key: &str, section: &str) -> Asset {
        Asset {
            key: key.to_string(),
            section: section.to_string(),
            label: key.to_string(),
            description: None,
            asset_type: AssetType::Text,
            value: None,
        }
    }

    #[tokio::test]
    async fn batch_save_invalidates_once_and_reports_count() {
        let h = harness(FakeStore::default());
        h.cache.put(&cached()).await;

        let receipt = h
            .editor
            .save_many(&[
                AssetUpdate::new("footer_text", "© 2024"),
                AssetUpdate::new("logo_url", "https://x/img.png"),
            ])
            .await
            .expect("batch saved");

        assert_eq!(receipt.updated, 2);
        assert_eq!(*h.storage.removals.lock().unwrap(), 1);
        assert!(h.cache.get().await.is_none());
        assert_eq!(h.store.batches.lock().unwrap().len(), 1);

        let notice = h.notices.last().expect("notice");
        assert_eq!(notice.kind, NoticeKind::Success);
        assert!(notice.text.contains('2'));
    }

    #[tokio::test]
    async fn single_save_with_empty_value_invalidates() {
        let h = harness(FakeStore::default());
        h.cache.put(&cached()).await;

        h.editor
            .save_one("footer_text", "")
            .await
            .expect("empty value is a valid write");

        assert_eq!(
            h.store.singles.lock().unwrap().as_slice(),
            [("footer_text".to_string(), String::new())]
        );
        assert!(h.cache.get().await.is_none());
        assert!(h.notices.last().is_some_and(|n| n.is_success()));
    }

    #[tokio::test]
    async fn rejected_write_keeps_cache_and_notifies_failure() {
        let h = harness(FakeStore::failing(StoreError::Rejected {
            message: "Unknown key: nope".to_string(),
        }));
        h.cache.put(&cached()).await;

        let err = h.editor.save_one("nope", "x").await.expect_err("rejected");

        assert!(matches!(err, EditorError::Rejected { .. }));
        assert_eq!(*h.storage.removals.lock().unwrap(), 0);
        assert!(h.cache.get().await.is_some());
        let notice = h.notices.last().expect("notice");
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.text.contains("Unknown key"));
    }

    #[tokio::test]
    async fn transport_failure_on_batch_keeps_cache() {
        let h = harness(FakeStore::failing(StoreError::transport("timed out")));
        h.cache.put(&cached()).await;

        let err = h
            .editor
            .save_many(&[AssetUpdate::new("footer_text", "new")])
            .await
            .expect_err("transport failure");

        assert!(matches!(err, EditorError::Store(StoreError::Transport(_))));
        assert!(h.cache.get().await.is_some());
        assert!(h.notices.last().is_some_and(|n| !n.is_success()));
    }

    #[tokio::test]
    async fn empty_batch_is_still_sent() {
        let h = harness(FakeStore::default());

        let receipt = h.editor.save_many(&[]).await.expect("empty batch");

        assert_eq!(receipt.updated, 0);
        assert_eq!(h.store.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_groups_in_first_occurrence_order() {
        let store = FakeStore {
            assets: vec![
                asset("footer_text", "footer"),
                asset("hero_title", "hero"),
                asset("footer_link", "footer"),
            ],
            ..Default::default()
        };
        let h = harness(store);

        let groups = h.editor.list_grouped().await.expect("listing");

        let names: Vec<&str> = groups.section_names().collect();
        assert_eq!(names, ["footer", "hero"]);
        let footer: Vec<&str> = groups
            .get("footer")
            .unwrap_or_default()
            .iter()
            .map(|a| a.key.as_str())
            .collect();
        assert_eq!(footer, ["footer_text", "footer_link"]);
    }
}
