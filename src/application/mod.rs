//! Application services: loading, applying and editing UI config.

pub mod applier;
pub mod editor;
pub mod error;
pub mod loader;
pub mod notify;
pub mod repos;

pub use applier::{
    ApplicationMode, ApplySummary, ConfigApplier, DisplaySink, DisplayTarget, SinkError, dispatch,
};
pub use editor::{AdminEditor, EditorError, SaveReceipt};
pub use loader::{ConfigLoader, LoadOutcome};
pub use notify::{LogNotifier, Notice, NoticeKind, NoticeLog, Notifier};
pub use repos::{AssetStore, SnapshotSource, StoreError, WriteAck};
