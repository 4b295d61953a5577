//! Pushes snapshot values into registered display targets.

use std::fmt;
use std::sync::Mutex;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::mutex_lock;
use crate::domain::ConfigSnapshot;

const SOURCE: &str = "application::applier";

pub(crate) const METRIC_APPLY_TARGET_FAILURE: &str = "placard_apply_target_failure_total";

/// How a value is written into its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApplicationMode {
    /// Visible text only; never interpreted as markup.
    #[default]
    Text,
    Placeholder,
    Image,
    /// Trusted markup from the authenticated admin path.
    RawHtml,
}

impl ApplicationMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "placeholder" => Some(Self::Placeholder),
            "image" => Some(Self::Image),
            "raw_html" | "raw-html" | "html" => Some(Self::RawHtml),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Placeholder => "placeholder",
            Self::Image => "image",
            Self::RawHtml => "raw_html",
        }
    }
}

impl fmt::Display for ApplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("target does not support {mode}")]
    Unsupported { mode: ApplicationMode },
    #[error("target write failed: {0}")]
    Write(String),
}

impl SinkError {
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }
}

/// Presentation element a value can be written into.
///
/// Every method defaults to [`SinkError::Unsupported`] so sinks only
/// implement the modes they can honour.
///
/// Sinks run while [`ConfigApplier::apply`] holds its target list. A sink may
/// call [`ConfigApplier::register`]; the new target joins on the next apply.
/// Calling `apply` or `len` on the same applier from a sink deadlocks.
pub trait DisplaySink {
    fn set_text(&mut self, _text: &str) -> Result<(), SinkError> {
        Err(SinkError::Unsupported {
            mode: ApplicationMode::Text,
        })
    }

    fn set_placeholder(&mut self, _text: &str) -> Result<(), SinkError> {
        Err(SinkError::Unsupported {
            mode: ApplicationMode::Placeholder,
        })
    }

    fn set_image_source(&mut self, _src: &str) -> Result<(), SinkError> {
        Err(SinkError::Unsupported {
            mode: ApplicationMode::Image,
        })
    }

    fn set_markup(&mut self, _markup: &str) -> Result<(), SinkError> {
        Err(SinkError::Unsupported {
            mode: ApplicationMode::RawHtml,
        })
    }
}

/// Route `value` to the sink method matching `mode`.
pub fn dispatch(
    mode: ApplicationMode,
    value: &str,
    sink: &mut dyn DisplaySink,
) -> Result<(), SinkError> {
    match mode {
        ApplicationMode::Text => sink.set_text(value),
        ApplicationMode::Placeholder => sink.set_placeholder(value),
        ApplicationMode::Image => sink.set_image_source(value),
        ApplicationMode::RawHtml => sink.set_markup(value),
    }
}

/// Binding between a config key and a sink.
pub struct DisplayTarget {
    pub key: String,
    pub mode: ApplicationMode,
    sink: Box<dyn DisplaySink + Send>,
}

impl DisplayTarget {
    pub fn new(
        key: impl Into<String>,
        mode: ApplicationMode,
        sink: impl DisplaySink + Send + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            mode,
            sink: Box::new(sink),
        }
    }
}

impl fmt::Debug for DisplayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayTarget")
            .field("key", &self.key)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Per-call tally, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ApplySummary {
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failed
    }

    pub(crate) fn record(&mut self, key: &str, mode: ApplicationMode, result: Result<(), SinkError>) {
        match result {
            Ok(()) => self.applied += 1,
            Err(err) => {
                self.failed += 1;
                counter!(METRIC_APPLY_TARGET_FAILURE).increment(1);
                warn!(key, mode = %mode, error = %err, "Display target could not be updated");
            }
        }
    }
}

/// Holds the registered targets and applies snapshots to them.
#[derive(Debug, Default)]
pub struct ConfigApplier {
    targets: Mutex<Vec<DisplayTarget>>,
    // Registrations land here first so `register` never waits on `apply`.
    pending: Mutex<Vec<DisplayTarget>>,
}

impl ConfigApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, target: DisplayTarget) {
        mutex_lock(&self.pending, SOURCE, "register").push(target);
    }

    pub fn len(&self) -> usize {
        let targets = mutex_lock(&self.targets, SOURCE, "len");
        targets.len() + mutex_lock(&self.pending, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every present value into its targets. Absent or null keys leave
    /// the target untouched; a failing target does not stop the rest.
    pub fn apply(&self, snapshot: &ConfigSnapshot) -> ApplySummary {
        let mut summary = ApplySummary::default();
        let mut targets = mutex_lock(&self.targets, SOURCE, "apply");
        targets.append(&mut mutex_lock(&self.pending, SOURCE, "apply"));

        for target in targets.iter_mut() {
            let Some(value) = snapshot.value(&target.key) else {
                summary.skipped += 1;
                continue;
            };
            let result = dispatch(target.mode, value, target.sink.as_mut());
            summary.record(&target.key, target.mode, result);
        }

        debug!(
            applied = summary.applied,
            skipped = summary.skipped,
            failed = summary.failed,
            "Applied config snapshot"
        );
        summary
    }
}
