//! Code validator.

use std::sync::Arc;

use alchemy_models::ComponentData;
use tracing::debug;

use crate::gateway::LlmGateway;
use crate::instructions::SystemInstructions;
use crate::prompts;
use crate::retry::{CallOutcome, RetryPolicy};
use crate::verdict::is_affirmative;

/// A reviewer's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Raw reviewer text, carried forward as repair instructions.
    pub feedback: String,
    /// Whether the reviewer accepted the component.
    pub accepted: bool,
}

impl Review {
    /// Interpret reviewer text.
    pub fn from_feedback(feedback: impl Into<String>) -> Self {
        let feedback = feedback.into();
        let accepted = is_affirmative(&feedback);
        Self { feedback, accepted }
    }
}

/// Reviews generated components against the acceptance checklist.
///
/// The attempt ceiling is a routing decision; the validator runs whenever
/// it is asked to.
pub struct CodeValidator {
    gateway: Arc<dyn LlmGateway>,
    retry: RetryPolicy,
    instructions: Arc<SystemInstructions>,
}

impl CodeValidator {
    /// Create a validator.
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        retry: RetryPolicy,
        instructions: Arc<SystemInstructions>,
    ) -> Self {
        Self {
            gateway,
            retry,
            instructions,
        }
    }

    /// Review `component` against the original request.
    pub async fn review(&self, component: &ComponentData, request: &str) -> CallOutcome<Review> {
        let messages = prompts::validation(&self.instructions, component, request);
        let outcome = self
            .retry
            .run("validate", || self.gateway.complete(&messages))
            .await
            .map(Review::from_feedback);

        if let Ok(review) = &outcome.value {
            debug!(accepted = review.accepted, "Review complete");
        }
        outcome
    }
}
