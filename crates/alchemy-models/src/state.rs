//! Session state and the patches that advance it.
//!
//! Every step of the controller receives a [`SessionState`] by value and
//! hands back a [`StatePatch`]. The patch names, per field, whether the step
//! replaces a value, appends to the history, prunes it, or bumps the attempt
//! counter; [`SessionState::apply`] is the only place those semantics live.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{ComponentData, ComponentSchema};
use crate::history::{ConversationHistory, Exchange, HistoryUpdate};
use crate::ids::SessionId;

/// Terminal marker of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// No terminal step has run yet.
    #[default]
    #[serde(rename = "")]
    Pending,
    /// The validator accepted the component.
    #[serde(rename = "success")]
    Success,
    /// The attempt ceiling was reached without acceptance.
    #[serde(rename = "validation_failure")]
    ValidationFailure,
    /// An unrecoverable gateway failure ended the session.
    #[serde(rename = "error")]
    Error,
}

impl Status {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "",
            Self::Success => "success",
            Self::ValidationFailure => "validation_failure",
            Self::Error => "error",
        }
    }

    /// Whether a terminal step has set this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of persistence and resumability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session identifier and continuation token.
    pub id: SessionId,

    /// Component schema profile this session generates against.
    #[serde(default)]
    pub schema: ComponentSchema,

    /// Evolving natural-language description of the component.
    pub component_request: String,

    /// Latest raw output of the requirement classifier.
    #[serde(default)]
    pub classifier_verdict: String,

    /// Clarification exchanges, oldest first.
    #[serde(default)]
    pub conversation_history: ConversationHistory,

    /// Last raw input from the human.
    #[serde(default)]
    pub user_input: String,

    /// Latest generated component; absent until generation succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_data: Option<ComponentData>,

    /// Set when the human opted out of further clarification.
    #[serde(default)]
    pub force_generate: bool,

    /// Latest validator output or repair instruction.
    #[serde(default)]
    pub validation_feedback: String,

    /// Validation cycles run so far. Only ever grows.
    #[serde(default)]
    pub validation_attempts: u32,

    /// Value of `validation_attempts` when the current generation round began.
    #[serde(default)]
    pub round_start_attempts: u32,

    /// Questions awaiting a human reply; set while the session is suspended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_questions: Option<String>,

    /// Terminal marker.
    #[serde(default)]
    pub status: Status,

    /// Explanation attached to an `error` status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionState {
    /// Create a fresh session for `request`.
    pub fn new(id: SessionId, request: impl Into<String>, schema: ComponentSchema) -> Self {
        Self {
            id,
            schema,
            component_request: request.into(),
            classifier_verdict: String::new(),
            conversation_history: ConversationHistory::new(),
            user_input: String::new(),
            component_data: None,
            force_generate: false,
            validation_feedback: String::new(),
            validation_attempts: 0,
            round_start_attempts: 0,
            pending_questions: None,
            status: Status::Pending,
            error: None,
        }
    }

    /// Whether the session is suspended waiting for a clarification reply.
    pub fn awaiting_input(&self) -> bool {
        self.pending_questions.is_some()
    }

    /// Whether a terminal step has run.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Validation cycles spent in the current generation round.
    pub fn attempts_this_round(&self) -> u32 {
        self.validation_attempts.saturating_sub(self.round_start_attempts)
    }

    /// Apply a patch, returning the next state.
    pub fn apply(mut self, patch: StatePatch) -> Self {
        if let Some(request) = patch.component_request {
            self.component_request = request;
        }
        if let Some(verdict) = patch.classifier_verdict {
            self.classifier_verdict = verdict;
        }
        if let Some(update) = patch.history {
            self.conversation_history = self.conversation_history.apply(update);
        }
        if let Some(input) = patch.user_input {
            self.user_input = input;
        }
        if let Some(component) = patch.component_data {
            self.component_data = Some(component);
        }
        if let Some(force) = patch.force_generate {
            self.force_generate = force;
        }
        if let Some(feedback) = patch.validation_feedback {
            self.validation_feedback = feedback;
        }
        if patch.count_attempt {
            self.validation_attempts += 1;
        }
        if patch.start_round {
            self.round_start_attempts = self.validation_attempts;
        }
        if let Some(questions) = patch.pending_questions {
            self.pending_questions = questions;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        self
    }
}

/// A set of field updates produced by one controller step.
///
/// Unset fields are left untouched. The attempt counter has no setter: a
/// step can only ask for it to be incremented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePatch {
    component_request: Option<String>,
    classifier_verdict: Option<String>,
    history: Option<HistoryUpdate>,
    user_input: Option<String>,
    component_data: Option<ComponentData>,
    force_generate: Option<bool>,
    validation_feedback: Option<String>,
    count_attempt: bool,
    start_round: bool,
    pending_questions: Option<Option<String>>,
    status: Option<Status>,
    error: Option<Option<String>>,
}

impl StatePatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the component request.
    pub fn component_request(mut self, request: impl Into<String>) -> Self {
        self.component_request = Some(request.into());
        self
    }

    /// Replace the classifier verdict.
    pub fn classifier_verdict(mut self, verdict: impl Into<String>) -> Self {
        self.classifier_verdict = Some(verdict.into());
        self
    }

    /// Append exchanges to the history.
    pub fn append_history(mut self, exchanges: Vec<Exchange>) -> Self {
        self.history = Some(HistoryUpdate::Append(exchanges));
        self
    }

    /// Prune the history to its last `keep` exchanges.
    pub fn prune_history(mut self, keep: usize) -> Self {
        self.history = Some(HistoryUpdate::Prune { keep });
        self
    }

    /// Replace the last human input.
    pub fn user_input(mut self, input: impl Into<String>) -> Self {
        self.user_input = Some(input.into());
        self
    }

    /// Replace the generated component.
    pub fn component_data(mut self, component: ComponentData) -> Self {
        self.component_data = Some(component);
        self
    }

    /// Set or clear the force-generate flag.
    pub fn force_generate(mut self, force: bool) -> Self {
        self.force_generate = Some(force);
        self
    }

    /// Replace the validation feedback.
    pub fn validation_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.validation_feedback = Some(feedback.into());
        self
    }

    /// Count one validation cycle.
    pub fn count_attempt(mut self) -> Self {
        self.count_attempt = true;
        self
    }

    /// Start a new generation round at the current attempt count.
    pub fn start_round(mut self) -> Self {
        self.start_round = true;
        self
    }

    /// Suspend with the given questions.
    pub fn suspend_with(mut self, questions: impl Into<String>) -> Self {
        self.pending_questions = Some(Some(questions.into()));
        self
    }

    /// Clear any pending questions.
    pub fn clear_pending(mut self) -> Self {
        self.pending_questions = Some(None);
        self
    }

    /// Set the status.
    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach an error explanation.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(Some(message.into()));
        self
    }

    /// Clear any error explanation.
    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> SessionState {
        SessionState::new(
            SessionId::from_string("s-1"),
            "Create a button",
            ComponentSchema::Full,
        )
    }

    #[test]
    fn test_new_state_defaults() {
        let state = fresh();
        assert_eq!(state.status, Status::Pending);
        assert_eq!(state.validation_attempts, 0);
        assert!(state.component_data.is_none());
        assert!(!state.awaiting_input());
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let state = fresh();
        assert_eq!(state.clone().apply(StatePatch::new()), state);
    }

    #[test]
    fn test_attempts_only_increase() {
        let state = fresh()
            .apply(StatePatch::new().count_attempt())
            .apply(StatePatch::new().count_attempt());
        assert_eq!(state.validation_attempts, 2);

        let state = state.apply(StatePatch::new().start_round());
        assert_eq!(state.validation_attempts, 2);
        assert_eq!(state.attempts_this_round(), 0);

        let state = state.apply(StatePatch::new().count_attempt());
        assert_eq!(state.validation_attempts, 3);
        assert_eq!(state.attempts_this_round(), 1);
    }

    #[test]
    fn test_append_and_prune_are_distinct() {
        let mut state = fresh();
        for i in 0..5 {
            state = state.apply(
                StatePatch::new().append_history(vec![Exchange::new(format!("q{i}"), "a")]),
            );
        }
        assert_eq!(state.conversation_history.len(), 5);

        let state = state.apply(StatePatch::new().prune_history(3));
        assert_eq!(state.conversation_history.len(), 3);
        assert_eq!(state.conversation_history.exchanges()[0].question, "q2");
    }

    #[test]
    fn test_suspend_and_clear() {
        let state = fresh().apply(StatePatch::new().suspend_with("What color?"));
        assert!(state.awaiting_input());

        let state = state.apply(StatePatch::new().clear_pending());
        assert!(!state.awaiting_input());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&Status::Pending).unwrap(), "\"\"");
        assert_eq!(
            serde_json::to_string(&Status::ValidationFailure).unwrap(),
            "\"validation_failure\""
        );
        let parsed: Status = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(parsed, Status::Success);
        assert!(Status::Error.is_terminal());
    }

    #[test]
    fn test_state_roundtrips_through_json() {
        let state = fresh().apply(
            StatePatch::new()
                .append_history(vec![Exchange::new("Color?", "blue")])
                .component_data(ComponentData::code_only("<b/>"))
                .validation_feedback("no: missing export")
                .count_attempt(),
        );

        let json = serde_json::to_string(&state).unwrap();
        let parsed: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
