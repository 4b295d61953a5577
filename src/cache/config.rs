//! Cache configuration.
//!
//! Controls the snapshot TTL and which session storage backs the cache.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub(crate) const DEFAULT_TTL_MS: u64 = 60_000;
pub(crate) const DEFAULT_SESSION_DIR_NAME: &str = "placard-session";

/// Which session storage backend holds the cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Process memory; gone when the process exits.
    Memory,
    /// Files in the session directory, shared by processes in one session.
    #[default]
    File,
    /// No storage at all; every load goes to the network.
    Disabled,
}

impl StorageKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "file" => Some(Self::File),
            "disabled" | "off" | "none" => Some(Self::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a fetched snapshot is served before it counts as stale.
    pub ttl: Duration,
    pub storage: StorageKind,
    /// Session directory for [`StorageKind::File`].
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(DEFAULT_TTL_MS),
            storage: StorageKind::default(),
            directory: std::env::temp_dir().join(DEFAULT_SESSION_DIR_NAME),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            storage: settings.storage,
            directory: settings.directory.clone(),
        }
    }
}
