//! User-visible notices raised by the admin editor.

use std::sync::Mutex;
use std::time::Duration;

use tracing::{error, info};
use uuid::Uuid;

use crate::cache::mutex_lock;

const SOURCE: &str = "application::notify";
const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(6000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }
}

/// Transient message for the editing UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub text: String,
    pub ttl: Duration,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self::with_kind(NoticeKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::with_kind(NoticeKind::Error, text)
    }

    fn with_kind(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            text: text.into(),
            ttl: DEFAULT_NOTICE_TTL,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}

/// Receives notices; delivery is fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => info!(notice_id = %notice.id, "{}", notice.text),
            NoticeKind::Error => error!(notice_id = %notice.id, "{}", notice.text),
        }
    }
}

/// Keeps every notice in memory, newest last.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        mutex_lock(&self.notices, SOURCE, "notices").clone()
    }

    pub fn last(&self) -> Option<Notice> {
        mutex_lock(&self.notices, SOURCE, "last").last().cloned()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        mutex_lock(&self.notices, SOURCE, "notify").push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_carry_kind_and_default_ttl() {
        let notice = Notice::success("Saved");
        assert!(notice.is_success());
        assert_eq!(notice.kind.as_str(), "success");
        assert_eq!(notice.ttl, Duration::from_millis(6000));

        let notice = Notice::error("Failed");
        assert!(!notice.is_success());
        assert_eq!(notice.kind.as_str(), "error");
    }

    #[test]
    fn notice_log_keeps_order() {
        let log = NoticeLog::new();
        log.notify(Notice::success("first"));
        log.notify(Notice::error("second"));

        let texts: Vec<String> = log.notices().into_iter().map(|n| n.text).collect();
        assert_eq!(texts, ["first", "second"]);
        assert_eq!(log.last().map(|n| n.kind), Some(NoticeKind::Error));
    }
}
