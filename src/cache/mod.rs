//! Placard config cache.
//!
//! Holds the last fetched [`ConfigSnapshot`](crate::domain::ConfigSnapshot)
//! in session-scoped storage for a bounded time:
//!
//! - **TTL**: a snapshot older than the configured TTL reads as a miss
//! - **Invalidation**: admin writes drop the entry so the next load re-fetches
//! - **Degradation**: storage errors never escape; they read as miss/no-op
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! ttl_ms = 60000
//! storage = "file"   # memory | file | disabled
//! directory = "/tmp/placard-session"
//! ```

mod clock;
mod config;
mod lock;
mod storage;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, StorageKind};
pub use storage::{DisabledStorage, FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::{CACHE_STORAGE_KEY, ConfigCache};

pub(crate) use config::{DEFAULT_SESSION_DIR_NAME, DEFAULT_TTL_MS};
pub(crate) use lock::mutex_lock;
