//! Time sources for cache freshness checks.

use std::sync::RwLock;

use time::{Duration, OffsetDateTime};

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::clock";

/// Source of "now" for the config cache.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
///
/// Lets callers step through TTL boundaries without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = rw_write(&self.now, SOURCE, "advance");
        *now += by;
    }

    pub fn set(&self, at: OffsetDateTime) {
        *rw_write(&self.now, SOURCE, "set") = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(OffsetDateTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *rw_read(&self.now, SOURCE, "now")
    }
}

/// Milliseconds since the Unix epoch, the unit persisted in cache records.
pub(crate) fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Like [`unix_millis`] but rounds a partial millisecond up.
///
/// Write stamps use this so a truncated read time never ages an entry past
/// its real age.
pub(crate) fn unix_millis_ceil(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() + 999_999).div_euclid(1_000_000) as i64
}
