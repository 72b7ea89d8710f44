//! Clarification elicitor.

use std::sync::Arc;

use alchemy_models::{Exchange, SessionState, StatePatch};
use tracing::debug;

use crate::gateway::LlmGateway;
use crate::instructions::SystemInstructions;
use crate::prompts;
use crate::retry::{CallOutcome, RetryPolicy};

/// Produces follow-up questions and folds the user's answers back in.
pub struct ClarificationElicitor {
    gateway: Arc<dyn LlmGateway>,
    retry: RetryPolicy,
    instructions: Arc<SystemInstructions>,
}

impl ClarificationElicitor {
    /// Create an elicitor.
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

    /// Ask the model for follow-up questions about the current request.
    pub async fn ask(&self, state: &SessionState) -> CallOutcome<String> {
        let messages = prompts::clarification(&self.instructions, &state.component_request);
        self.retry
            .run("clarify", || self.gateway.complete(&messages))
            .await
    }

    /// Merge a user reply into the session.
    ///
    /// The pending questions and the reply become one history exchange. A
    /// reply equal to `sentinel` (case-insensitive) forces generation and
    /// leaves the request untouched; anything else is appended to it.
    pub fn merge_reply(state: &SessionState, reply: &str, sentinel: &str) -> StatePatch {
        let question = state.pending_questions.clone().unwrap_or_default();
        let force = reply.trim().eq_ignore_ascii_case(sentinel.trim());

        debug!(session_id = %state.id, force_generate = force, "Merging clarification reply");

        let patch = StatePatch::new()
            .append_history(vec![Exchange::new(question, reply)])
            .user_input(reply)
            .force_generate(force)
            .clear_pending();

        if force {
            patch
        } else {
            patch.component_request(format!("{} {}", state.component_request, reply))
        }
    }
}
