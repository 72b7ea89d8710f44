//! Error types for the orchestrator.

use thiserror::Error;

/// Orchestrator-specific errors.
///
/// Gateway failures are not errors at this level: they end the session
/// with an `error` status instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Session not found or expired.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A reply was sent to a session that is not waiting for one.
    #[error("Session {0} is not awaiting input")]
    NotAwaitingInput(String),

    /// Edit requested on a session without a finished component.
    #[error("Session {id} cannot be edited: {reason}")]
    NotEditable {
        /// Session id.
        id: String,
        /// Why the edit was refused.
        reason: String,
    },

    /// Caller input was rejected.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence error.
    #[error("Persistence error: {0}")]
    Persistence(#[from] alchemy_persistence::PersistenceError),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
