use std::sync::Arc;

use placard_api_types::{Asset, UiConfigMap};
use serde::{Deserialize, Serialize};

/// Immutable key → value view of every asset, as cached and applied.
///
/// Cloning is cheap; the underlying map is shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ConfigSnapshot {
    entries: Arc<UiConfigMap>,
}

impl ConfigSnapshot {
    pub fn new(entries: UiConfigMap) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Flatten an asset list into its snapshot form.
    pub fn from_assets(assets: &[Asset]) -> Self {
        let entries = assets
            .iter()
            .map(|asset| (asset.key.clone(), asset.value.clone()))
            .collect();
        Self::new(entries)
    }

    /// Resolved value for `key`; `None` when the key is missing or null.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|value| value.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &UiConfigMap {
        &self.entries
    }
}

impl From<UiConfigMap> for ConfigSnapshot {
    fn from(entries: UiConfigMap) -> Self {
        Self::new(entries)
    }
}

impl FromIterator<(String, Option<String>)> for ConfigSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
