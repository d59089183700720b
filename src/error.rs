//! Voxkit Error Types
//!
//! Centralized error handling for the voice command pipeline.

use thiserror::Error;

/// Central error type for voxkit
#[derive(Error, Debug)]
pub enum VoxError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("confidence below threshold: {0}")]
    LowConfidence(String),

    #[error("no matching command: {0}")]
    NoMatch(String),

    #[error("value conversion failed: {0}")]
    ValueConversion(String),

    #[error("audio capture error: {0}")]
    Capture(String),

    #[error("wake word is required for wake-word listening mode")]
    MissingWakeWord,

    #[error("assistant is already running")]
    AlreadyRunning,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for voxkit operations
pub type VoxResult<T> = Result<T, VoxError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for VoxError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        VoxError::Lock(err.to_string())
    }
}
