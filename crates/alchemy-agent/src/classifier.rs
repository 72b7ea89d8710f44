//! Requirement classifier.

use std::sync::Arc;

use alchemy_models::SessionState;
use tracing::debug;

use crate::gateway::LlmGateway;
use crate::instructions::SystemInstructions;
use crate::prompts;
use crate::retry::{CallOutcome, RetryPolicy};

/// Decides whether a request has enough detail to generate from.
///
/// Returns the raw verdict text; routing interprets it with
/// [`is_affirmative`](crate::verdict::is_affirmative). A failed call is
/// reported as a failed outcome, never as a verdict.
pub struct RequirementClassifier {
    gateway: Arc<dyn LlmGateway>,
    retry: RetryPolicy,
    instructions: Arc<SystemInstructions>,
}

impl RequirementClassifier {
    /// Create a classifier.
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

    /// Classify the current request.
    pub async fn classify(&self, state: &SessionState) -> CallOutcome<String> {
        let messages = prompts::classification(&self.instructions, &state.component_request);
        let outcome = self
            .retry
            .run("classify", || self.gateway.complete(&messages))
            .await;

        if let Ok(verdict) = &outcome.value {
            debug!(session_id = %state.id, verdict = %verdict.trim(), "Classifier verdict");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::testing::{MockGateway, Reply};
    use alchemy_models::{ComponentSchema, SessionId};

    fn classifier(gateway: &Arc<MockGateway>) -> RequirementClassifier {
        RequirementClassifier::new(
            gateway.clone(),
            RetryPolicy::default(),
            Arc::new(SystemInstructions::default()),
        )
    }

    #[tokio::test]
    async fn test_classify_returns_verdict() {
        let gateway = Arc::new(MockGateway::new(vec![Reply::text("Yes, detailed enough")]));
        let state = SessionState::new(SessionId::from("s"), "A red card", ComponentSchema::Full);

        let outcome = classifier(&gateway).classify(&state).await;

        assert_eq!(outcome.into_result().unwrap(), "Yes, detailed enough");
        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].messages[1].content.contains("A red card"));
    }

    #[tokio::test]
    async fn test_classify_failure_is_not_a_verdict() {
        let gateway = Arc::new(MockGateway::new(vec![Reply::error(
            GatewayError::Unauthorized("bad key".into()),
        )]));
        let state = SessionState::new(SessionId::from("s"), "A card", ComponentSchema::Full);

        let outcome = classifier(&gateway).classify(&state).await;

        assert!(!outcome.success());
        assert!(outcome.error_message().unwrap().contains("unauthorized"));
    }
}
