//! Request DTOs for the API.

use serde::Deserialize;

/// Request to start a session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    /// Natural-language description of the component.
    pub description: String,
}

/// Reply to the session's follow-up questions.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    /// The user's answer, or `generate` to skip further questions.
    pub message: String,
}

/// Change request for a finished component.
#[derive(Debug, Clone, Deserialize)]
pub struct EditComponentRequest {
    /// What should change.
    pub feedback: String,
}
