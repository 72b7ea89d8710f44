//! Error types for persistence operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during persistence operations.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to read from file system.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write to file system.
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize or deserialize a record.
    #[error("failed to serialize: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Failed to create directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Session not found.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Session id cannot be mapped to a storage key.
    #[error("invalid session id: {0}")]
    InvalidId(String),

    /// In-memory store lock was poisoned.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PersistenceError::NotFound("abc".into());
        assert_eq!(err.to_string(), "session not found: abc");

        let err = PersistenceError::InvalidId("../x".into());
        assert_eq!(err.to_string(), "invalid session id: ../x");
    }
}
