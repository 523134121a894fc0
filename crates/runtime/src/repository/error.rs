//! Error types raised by snapshot store implementations.

use thiserror::Error;

/// Errors surfaced by snapshot stores.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no snapshot exists for `{0}`")]
    MissingResource(String),

    #[error("snapshot store lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl RepositoryError {
    /// True when the error only signals that no snapshot exists yet.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingResource(_))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
