//! Node identifiers and the pure routing rules between them.

use std::fmt;

use alchemy_agent::is_affirmative;
use alchemy_models::SessionState;

/// The node the controller runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Classify the request.
    UnderstandRequirements,
    /// Ask follow-up questions, then suspend.
    AskForClarification,
    /// Generate (or repair) the component.
    GenerateCode {
        /// Prune history first; set on the "enough detail" edge only.
        prune_history: bool,
    },
    /// Review the component.
    ValidateCode,
    /// Mark the session as failed validation.
    HandleValidationError,
    /// Report the terminal outcome.
    GetFinalResponse,
    /// Stop and wait for the user's reply.
    Suspend,
    /// Stop; the session is finished.
    Halt,
}

impl fmt::Display for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnderstandRequirements => "understand_requirements",
            Self::AskForClarification => "ask_for_clarification",
            Self::GenerateCode { .. } => "generate_code",
            Self::ValidateCode => "validate_code",
            Self::HandleValidationError => "handle_validation_error",
            Self::GetFinalResponse => "get_final_response",
            Self::Suspend => "suspend",
            Self::Halt => "halt",
        };
        write!(f, "{}", name)
    }
}

/// After classification: generate when forced or the verdict is positive.
pub fn route_requirements(state: &SessionState) -> Next {
    if state.force_generate || is_affirmative(&state.classifier_verdict) {
        Next::GenerateCode {
            prune_history: true,
        }
    } else {
        Next::AskForClarification
    }
}

/// After a clarification reply: generate when forced, otherwise reclassify.
pub fn route_after_clarification(state: &SessionState) -> Next {
    if state.force_generate {
        Next::GenerateCode {
            prune_history: true,
        }
    } else {
        Next::UnderstandRequirements
    }
}

/// After a review.
///
/// The ceiling is checked before acceptance so a rejected component at the
/// limit fails closed instead of generating again.
pub fn route_validation(state: &SessionState, max_attempts: u32) -> Next {
    let accepted = is_affirmative(&state.validation_feedback);
    if state.attempts_this_round() >= max_attempts && !accepted {
        Next::HandleValidationError
    } else if accepted {
        Next::GetFinalResponse
    } else {
        Next::GenerateCode {
            prune_history: false,
        }
    }
}

/// After a generation that produced nothing usable.
///
/// Counts like a rejection, without consulting the feedback text.
pub fn route_rejection(state: &SessionState, max_attempts: u32) -> Next {
    if state.attempts_this_round() >= max_attempts {
        Next::HandleValidationError
    } else {
        Next::GenerateCode {
            prune_history: false,
        }
    }
}
