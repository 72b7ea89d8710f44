//! Response DTOs for the API.

use std::collections::BTreeMap;

use alchemy_models::{SessionState, Status};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// The outcome of a session step.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Token for follow-up requests.
    pub session_id: String,
    /// `""`, `success`, `validation_failure` or `error`.
    pub status: String,
    /// Questions, feedback or a summary, depending on status.
    pub message: String,
    /// Whether the session is waiting for a reply.
    pub requires_input: bool,
    /// Generated component fields, once a component exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_data: Option<BTreeMap<String, String>>,
}

impl From<&SessionState> for SessionResponse {
    fn from(state: &SessionState) -> Self {
        Self {
            session_id: state.id.to_string(),
            status: state.status.as_str().to_string(),
            message: message_for(state),
            requires_input: state.awaiting_input(),
            component_data: state.component_data.as_ref().map(|c| c.to_map()),
        }
    }
}

fn message_for(state: &SessionState) -> String {
    if let Some(questions) = &state.pending_questions {
        return questions.clone();
    }

    match state.status {
        Status::Error => state
            .error
            .clone()
            .unwrap_or_else(|| "session failed".to_string()),
        Status::ValidationFailure => format!(
            "Component did not pass review after {} attempts: {}",
            state.attempts_this_round(),
            state.validation_feedback
        ),
        Status::Success => state
            .component_data
            .as_ref()
            .and_then(|c| c.description.clone())
            .unwrap_or_else(|| "component generated".to_string()),
        Status::Pending => "in progress".to_string(),
    }
}
