use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{editor::EditorError, repos::StoreError},
    config::LoadError,
    infra::{document::DocumentError, error::InfraError},
};

/// Flattened error chain for logging.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    /// Messages joined outermost first.
    pub fn chain(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    /// Save failure the editor already surfaced through its notifier.
    #[error(transparent)]
    Save(EditorError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("config snapshot unavailable: {0}")]
    Unavailable(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Whether the user has already been told about this failure.
    pub fn is_notified(&self) -> bool {
        matches!(self, AppError::Save(_))
    }

    /// Process exit status for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Validation(_) => 2,
            AppError::Editor(EditorError::Rejected { .. })
            | AppError::Save(EditorError::Rejected { .. }) => 3,
            AppError::Store(_)
            | AppError::Editor(_)
            | AppError::Save(_)
            | AppError::Unavailable(_) => 4,
            AppError::Infra(_) | AppError::Document(_) | AppError::Unexpected(_) => 1,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_the_source_chain() {
        let err = AppError::from(EditorError::Store(StoreError::Status {
            status: 503,
            body: "maintenance".to_string(),
        }));

        let report = err.report();
        assert_eq!(report.source, "application::error::AppError");
        assert!(report.messages.len() >= 2);
        assert!(report.chain().contains("503"));
    }

    #[test]
    fn rejected_writes_map_to_their_own_exit_code() {
        let err = AppError::from(EditorError::Rejected {
            message: "Unknown key".to_string(),
        });
        assert_eq!(err.exit_code(), 3);
        assert_eq!(AppError::validation("bad").exit_code(), 2);
        assert_eq!(AppError::unavailable("down").exit_code(), 4);
    }

    #[test]
    fn save_failures_are_marked_as_already_notified() {
        let err = AppError::Save(EditorError::Rejected {
            message: "Unknown key".to_string(),
        });
        assert!(err.is_notified());
        assert_eq!(err.exit_code(), 3);

        let err = AppError::Save(EditorError::Store(StoreError::transport("timed out")));
        assert!(err.is_notified());
        assert_eq!(err.exit_code(), 4);

        let listing = AppError::from(EditorError::Store(StoreError::transport("timed out")));
        assert!(!listing.is_notified());
    }
}
