use thiserror::Error;

/// Errors produced by the progress event log and its read/write paths.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session already exists: {0}")]
    SessionExists(String),

    #[error("session closed: {0}")]
    SessionClosed(String),

    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
