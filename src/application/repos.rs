//! Traits describing the asset store adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Asset, AssetUpdate, ConfigSnapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("asset store unreachable: {0}")]
    Transport(String),
    #[error("asset store answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("asset store response could not be decoded: {0}")]
    Decode(String),
    #[error("asset store rejected the write: {message}")]
    Rejected { message: String },
    #[error("invalid asset store url: {0}")]
    Url(#[from] url::ParseError),
}

impl StoreError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Outcome of a write the store accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    /// Entries the store reports as written.
    pub updated: usize,
    pub message: Option<String>,
}

/// Public read side: the flattened snapshot.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<ConfigSnapshot, StoreError>;
}

/// Admin side: full asset listing and writes.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn list_assets(&self) -> Result<Vec<Asset>, StoreError>;

    async fn update_asset(&self, key: &str, value: &str) -> Result<WriteAck, StoreError>;

    async fn update_assets(&self, updates: &[AssetUpdate]) -> Result<WriteAck, StoreError>;
}
