//! The session controller state machine.
//!
//! ```text
//! understand_requirements ──yes/forced──▶ generate_code ──▶ validate_code ──yes──▶ get_final_response
//!        │    ▲                              ▲    │             │
//!        no   │ reply                        └────┘ no          │ no, ceiling reached
//!        ▼    │                           (malformed)           ▼
//!  ask_for_clarification ──▶ suspend                  handle_validation_error ──▶ get_final_response
//! ```
//!
//! Each node takes the state by value and returns the next state together
//! with the [`Next`] node. The loop in [`SessionController::run`] is the only
//! place that dispatches.

use std::sync::Arc;

use alchemy_agent::{
    ClarificationElicitor, CodeGenerator, CodeValidator, GatewayError, Generation, LlmGateway,
    RequirementClassifier, RetryPolicy,
};
use alchemy_models::{SessionId, SessionState, StatePatch, Status};
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::{OrchestratorError, Result};
use crate::routing::{
    route_after_clarification, route_rejection, route_requirements, route_validation, Next,
};

/// Drives sessions through classification, clarification, generation and review.
pub struct SessionController {
    classifier: RequirementClassifier,
    elicitor: ClarificationElicitor,
    generator: CodeGenerator,
    validator: CodeValidator,
    config: ControllerConfig,
}

impl SessionController {
    /// Create a controller with the default retry policy.
    pub fn new(gateway: Arc<dyn LlmGateway>, config: ControllerConfig) -> Self {
        Self::with_retry_policy(gateway, config, RetryPolicy::default())
    }

    /// Create a controller with an explicit retry policy.
    pub fn with_retry_policy(
        gateway: Arc<dyn LlmGateway>,
        config: ControllerConfig,
        retry: RetryPolicy,
    ) -> Self {
        let instructions = Arc::clone(&config.instructions);
        Self {
            classifier: RequirementClassifier::new(
                Arc::clone(&gateway),
                retry,
                Arc::clone(&instructions),
            ),
            elicitor: ClarificationElicitor::new(
                Arc::clone(&gateway),
                retry,
                Arc::clone(&instructions),
            ),
            generator: CodeGenerator::new(Arc::clone(&gateway), retry, Arc::clone(&instructions)),
            validator: CodeValidator::new(gateway, retry, instructions),
            config,
        }
    }

    /// Controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Start a session and run it until it suspends or finishes.
    pub async fn start(&self, id: SessionId, request: impl Into<String>) -> SessionState {
        let state = SessionState::new(id, request, self.config.schema);
        info!(session_id = %state.id, schema = %state.schema, "Starting session");
        self.run(state, Next::UnderstandRequirements).await
    }

    /// Resume a suspended session with the user's reply.
    pub async fn resume(&self, state: SessionState, input: &str) -> Result<SessionState> {
        if !state.awaiting_input() {
            return Err(OrchestratorError::NotAwaitingInput(state.id.to_string()));
        }

        let patch =
            ClarificationElicitor::merge_reply(&state, input, &self.config.force_generate_sentinel);
        let state = state.apply(patch);
        let next = route_after_clarification(&state);
        info!(session_id = %state.id, next = %next, "Resuming session");
        Ok(self.run(state, next).await)
    }

    /// Start a new repair round on a finished component.
    ///
    /// The attempt ceiling applies to the new round; the attempt counter
    /// keeps growing.
    pub async fn edit(&self, state: SessionState, feedback: &str) -> Result<SessionState> {
        let not_editable = |reason: &str| OrchestratorError::NotEditable {
            id: state.id.to_string(),
            reason: reason.to_string(),
        };
        if state.awaiting_input() {
            return Err(not_editable("session is awaiting clarification"));
        }
        if state.component_data.is_none() {
            return Err(not_editable("no component has been generated"));
        }
        if feedback.trim().is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "feedback must not be empty".into(),
            ));
        }

        let state = state.apply(
            StatePatch::new()
                .validation_feedback(feedback.trim())
                .status(Status::Pending)
                .clear_error()
                .start_round(),
        );
        info!(session_id = %state.id, "Editing component");
        Ok(self
            .run(
                state,
                Next::GenerateCode {
                    prune_history: false,
                },
            )
            .await)
    }

    async fn run(&self, mut state: SessionState, mut next: Next) -> SessionState {
        loop {
            debug!(session_id = %state.id, node = %next, "Entering node");
            (state, next) = match next {
                Next::UnderstandRequirements => self.understand_requirements(state).await,
                Next::AskForClarification => self.ask_for_clarification(state).await,
                Next::GenerateCode { prune_history } => {
                    self.generate_code(state, prune_history).await
                }
                Next::ValidateCode => self.validate_code(state).await,
                Next::HandleValidationError => handle_validation_error(state),
                Next::GetFinalResponse => get_final_response(state),
                Next::Suspend => {
                    info!(session_id = %state.id, "Awaiting user input");
                    return state;
                }
                Next::Halt => {
                    info!(
                        session_id = %state.id,
                        status = %state.status,
                        attempts = state.validation_attempts,
                        "Session finished"
                    );
                    return state;
                }
            };
        }
    }

    async fn understand_requirements(&self, state: SessionState) -> (SessionState, Next) {
        match self.classifier.classify(&state).await.into_result() {
            Ok(verdict) => {
                let state = state.apply(StatePatch::new().classifier_verdict(verdict));
                let next = route_requirements(&state);
                (state, next)
            }
            Err(GatewayError::Malformed(reason)) => {
                warn!(
                    session_id = %state.id,
                    reason = %reason,
                    "Unreadable classification, treating as no"
                );
                let state = state.apply(StatePatch::new().classifier_verdict(String::new()));
                let next = route_requirements(&state);
                (state, next)
            }
            Err(e) => fail(state, "classification", e),
        }
    }

    async fn ask_for_clarification(&self, state: SessionState) -> (SessionState, Next) {
        match self.elicitor.ask(&state).await.into_result() {
            Ok(questions) => (
                state.apply(StatePatch::new().suspend_with(questions)),
                Next::Suspend,
            ),
            Err(e) => fail(state, "clarification", e),
        }
    }

    async fn generate_code(&self, state: SessionState, prune: bool) -> (SessionState, Next) {
        let state = if prune {
            state.apply(StatePatch::new().prune_history(self.config.history_keep))
        } else {
            state
        };

        match self.generator.generate(&state).await {
            Generation::Component(component) => (
                state.apply(StatePatch::new().component_data(component)),
                Next::ValidateCode,
            ),
            Generation::Malformed(reason) => self.reject_unusable(state, &reason),
            Generation::Failed(e) => fail(state, "generation", e),
        }
    }

    async fn validate_code(&self, state: SessionState) -> (SessionState, Next) {
        let Some(component) = state.component_data.as_ref() else {
            return self.reject_unusable(state, "there is no component to review");
        };

        let outcome = self
            .validator
            .review(component, &state.component_request)
            .await;
        match outcome.into_result() {
            Ok(review) => {
                let state = state.apply(
                    StatePatch::new()
                        .validation_feedback(review.feedback)
                        .count_attempt(),
                );
                debug!(
                    session_id = %state.id,
                    attempt = state.validation_attempts,
                    accepted = review.accepted,
                    "Component reviewed"
                );
                let next = route_validation(&state, self.config.max_validation_attempts);
                (state, next)
            }
            Err(GatewayError::Malformed(reason)) => {
                warn!(
                    session_id = %state.id,
                    reason = %reason,
                    "Unreadable review, counting as rejection"
                );
                let feedback = format!("The review could not be read ({}).", reason);
                let state =
                    state.apply(StatePatch::new().validation_feedback(feedback).count_attempt());
                let next = route_rejection(&state, self.config.max_validation_attempts);
                (state, next)
            }
            Err(e) => fail(state, "validation", e),
        }
    }

    /// Treat unusable generator output as a rejected attempt.
    fn reject_unusable(&self, state: SessionState, reason: &str) -> (SessionState, Next) {
        warn!(session_id = %state.id, reason, "Generation produced no usable component");
        let feedback = format!(
            "No usable component was returned ({}). Call the {} tool with every required field filled in.",
            reason,
            state.schema.tool_name()
        );
        let state = state.apply(StatePatch::new().validation_feedback(feedback).count_attempt());
        let next = route_rejection(&state, self.config.max_validation_attempts);
        (state, next)
    }
}

fn handle_validation_error(state: SessionState) -> (SessionState, Next) {
    warn!(
        session_id = %state.id,
        attempts = state.validation_attempts,
        "Validation ceiling reached"
    );
    (
        state.apply(StatePatch::new().status(Status::ValidationFailure)),
        Next::GetFinalResponse,
    )
}

fn get_final_response(state: SessionState) -> (SessionState, Next) {
    if state.status == Status::Pending {
        (
            state.apply(StatePatch::new().status(Status::Success)),
            Next::Halt,
        )
    } else {
        (state, Next::Halt)
    }
}

/// End the session on a gateway failure.
fn fail(state: SessionState, stage: &str, error: GatewayError) -> (SessionState, Next) {
    warn!(session_id = %state.id, stage, error = %error, "Gateway call failed, ending session");
    (
        state.apply(
            StatePatch::new()
                .status(Status::Error)
                .error(format!("{} failed: {}", stage, error))
                .clear_pending(),
        ),
        Next::Halt,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alchemy_agent::testing::{CallKind, MockGateway, Reply};
    use alchemy_models::{ComponentSchema, Exchange};
    use serde_json::json;

    fn component_args() -> serde_json::Value {
        json!({
            "install_script": "npm install @mui/material @emotion/react @emotion/styled",
            "imports": "import Button from '@mui/material/Button';",
            "code": "export default function MUIComponent() { return <Button>Save</Button>; }",
            "description": "A blue rounded Save button",
        })
    }

    fn controller(gateway: &Arc<MockGateway>) -> SessionController {
        SessionController::new(gateway.clone(), ControllerConfig::default())
    }

    fn tool_calls(gateway: &MockGateway) -> usize {
        gateway.count(&CallKind::Tool("ui_gen_function".into()))
    }

    #[tokio::test]
    async fn test_clarify_then_generate() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("no"),
            Reply::text("What color? Rounded corners? What label?"),
        ]));
        let controller = controller(&gateway);

        let state = controller.start(SessionId::from("a"), "Create a button").await;
        assert!(state.awaiting_input());
        assert_eq!(state.status, Status::Pending);
        assert_eq!(
            state.pending_questions.as_deref(),
            Some("What color? Rounded corners? What label?")
        );

        gateway.push(Reply::text("yes"));
        gateway.push(Reply::tool(component_args()));
        gateway.push(Reply::text("yes"));

        let state = controller
            .resume(state, "blue, rounded, says Save")
            .await
            .unwrap();

        assert_eq!(state.status, Status::Success);
        assert_eq!(state.component_request, "Create a button blue, rounded, says Save");
        assert_eq!(state.validation_attempts, 1);
        assert!(state.component_data.is_some());
        assert_eq!(
            state.conversation_history.exchanges(),
            &[Exchange::new(
                "What color? Rounded corners? What label?",
                "blue, rounded, says Save"
            )]
        );
        assert_eq!(gateway.remaining(), 0);
    }

    #[tokio::test]
    async fn test_validation_ceiling_fails_closed() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::text("no - missing default export"),
            Reply::tool(component_args()),
            Reply::text("no - still not self contained"),
            Reply::tool(component_args()),
            Reply::text("no - request not met"),
        ]));

        let state = controller(&gateway)
            .start(
                SessionId::from("b"),
                "Build a donut chart showing task completion at 80%. Use pink and white.",
            )
            .await;

        assert_eq!(state.status, Status::ValidationFailure);
        assert_eq!(state.validation_attempts, 3);
        assert_eq!(state.validation_feedback, "no - request not met");
        assert!(state.component_data.is_some());
        assert_eq!(tool_calls(&gateway), 3);
        assert_eq!(gateway.remaining(), 0);
    }

    #[tokio::test]
    async fn test_acceptance_short_circuits() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::text("Yes"),
        ]));

        let state = controller(&gateway)
            .start(SessionId::from("c"), "A blue Save button")
            .await;

        assert_eq!(state.status, Status::Success);
        assert_eq!(tool_calls(&gateway), 1);
    }

    #[tokio::test]
    async fn test_repair_prompt_carries_feedback() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::text("no - use a Card"),
            Reply::tool(component_args()),
            Reply::text("yes"),
        ]));

        let state = controller(&gateway)
            .start(SessionId::from("r"), "A profile card")
            .await;

        assert_eq!(state.status, Status::Success);
        assert_eq!(state.validation_attempts, 2);
        let calls = gateway.calls();
        let repair = &calls[3];
        assert!(repair.messages[1].content.contains("## FEEDBACK ##\nno - use a Card"));
    }

    #[tokio::test]
    async fn test_force_generate_skips_classifier() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("no"),
            Reply::text("Which colors?"),
        ]));
        let controller = controller(&gateway);
        let state = controller.start(SessionId::from("f"), "Make a chart").await;

        gateway.push(Reply::tool(component_args()));
        gateway.push(Reply::text("yes"));
        let state = controller.resume(state, "generate").await.unwrap();

        assert_eq!(state.status, Status::Success);
        assert!(state.force_generate);
        assert_eq!(state.component_request, "Make a chart");
        assert_eq!(gateway.count(&CallKind::Text), 3);
    }

    #[tokio::test]
    async fn test_history_pruned_before_generation() {
        let gateway = Arc::new(MockGateway::new(vec![]));
        let controller = controller(&gateway);

        // A suspended session with four clarification rounds behind it.
        let mut state = SessionState::new(SessionId::from("h"), "widget", ComponentSchema::Full);
        for i in 0..4 {
            state.pending_questions = Some(format!("q{}", i));
            let patch = ClarificationElicitor::merge_reply(&state, &format!("a{}", i), "generate");
            state = state.apply(patch);
        }
        state.pending_questions = Some("q4".into());

        gateway.push(Reply::text("yes"));
        gateway.push(Reply::tool(component_args()));
        gateway.push(Reply::text("yes"));
        let state = controller.resume(state, "a4").await.unwrap();

        let answers: Vec<_> = state
            .conversation_history
            .exchanges()
            .iter()
            .map(|e| e.answer.as_str())
            .collect();
        assert_eq!(answers, vec!["a2", "a3", "a4"]);

        let generation = gateway
            .calls()
            .into_iter()
            .find(|c| matches!(c.kind, CallKind::Tool(_)))
            .unwrap();
        assert!(!generation.messages[1].content.contains("Answer: a1"));
        assert!(generation.messages[1].content.contains("Answer: a4"));
    }

    #[tokio::test]
    async fn test_malformed_generation_counts_as_attempt() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::no_tool(),
            Reply::tool(component_args()),
            Reply::text("yes"),
        ]));

        let state = controller(&gateway)
            .start(SessionId::from("m"), "A blue Save button")
            .await;

        assert_eq!(state.status, Status::Success);
        assert_eq!(state.validation_attempts, 2);
        assert_eq!(gateway.count(&CallKind::Text), 2);
    }

    #[tokio::test]
    async fn test_malformed_every_time_hits_ceiling() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::no_tool(),
            Reply::tool(json!({"code": "<div/>"})),
            Reply::no_tool(),
        ]));

        let state = controller(&gateway)
            .start(SessionId::from("mm"), "A blue Save button")
            .await;

        assert_eq!(state.status, Status::ValidationFailure);
        assert_eq!(state.validation_attempts, 3);
        assert!(state.component_data.is_none());
        assert_eq!(gateway.count(&CallKind::Text), 1);
    }

    #[tokio::test]
    async fn test_classifier_failure_ends_with_error() {
        let gateway = Arc::new(MockGateway::new(vec![Reply::error(
            GatewayError::Unauthorized("invalid key".into()),
        )]));

        let state = controller(&gateway)
            .start(SessionId::from("e"), "Create a button")
            .await;

        assert_eq!(state.status, Status::Error);
        assert!(state.error.as_deref().unwrap().contains("classification failed"));
        assert!(!state.awaiting_input());
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_classification_asks_for_clarification() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::error(GatewayError::Malformed("response has no choices".into())),
            Reply::text("What color?"),
        ]));

        let state = controller(&gateway)
            .start(SessionId::from("uc"), "Create a button")
            .await;

        assert_eq!(state.status, Status::Pending);
        assert!(state.awaiting_input());
        assert!(state.error.is_none());
        assert_eq!(state.pending_questions.as_deref(), Some("What color?"));
        assert_eq!(gateway.remaining(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_review_counts_as_rejection() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::error(GatewayError::Malformed("response has no choices".into())),
            Reply::tool(component_args()),
            Reply::text("yes"),
        ]));

        let state = controller(&gateway)
            .start(SessionId::from("ur"), "A blue Save button")
            .await;

        assert_eq!(state.status, Status::Success);
        assert_eq!(state.validation_attempts, 2);
        assert!(state.error.is_none());
        assert_eq!(tool_calls(&gateway), 2);
        assert_eq!(gateway.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_generation_recovers() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::error(GatewayError::RateLimited { retry_after: None }),
            Reply::tool(component_args()),
            Reply::text("yes"),
        ]));

        let start = tokio::time::Instant::now();
        let state = controller(&gateway)
            .start(SessionId::from("rl"), "A blue Save button")
            .await;

        assert_eq!(state.status, Status::Success);
        assert_eq!(state.validation_attempts, 1);
        assert!(start.elapsed() >= std::time::Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_resume_requires_pending_questions() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::text("yes"),
        ]));
        let controller = controller(&gateway);
        let state = controller.start(SessionId::from("x"), "A blue button").await;

        let result = controller.resume(state, "more").await;
        assert!(matches!(result, Err(OrchestratorError::NotAwaitingInput(_))));
    }

    #[tokio::test]
    async fn test_edit_starts_new_round() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("yes"),
            Reply::tool(component_args()),
            Reply::text("yes"),
        ]));
        let controller = controller(&gateway);
        let state = controller.start(SessionId::from("ed"), "A blue button").await;
        assert_eq!(state.validation_attempts, 1);

        for _ in 0..3 {
            gateway.push(Reply::tool(component_args()));
            gateway.push(Reply::text("no - make it red"));
        }
        let state = controller.edit(state, "Make it red").await.unwrap();

        assert_eq!(state.status, Status::ValidationFailure);
        assert_eq!(state.validation_attempts, 4);
        assert_eq!(state.round_start_attempts, 1);
        assert_eq!(tool_calls(&gateway), 4);

        let calls = gateway.calls();
        assert!(calls[3].messages[1].content.contains("## FEEDBACK ##\nMake it red"));
    }

    #[tokio::test]
    async fn test_edit_requires_component() {
        let gateway = Arc::new(MockGateway::new(vec![
            Reply::text("no"),
            Reply::text("Which colors?"),
        ]));
        let controller = controller(&gateway);
        let state = controller.start(SessionId::from("ne"), "Make a chart").await;

        let result = controller.edit(state, "red").await;
        assert!(matches!(result, Err(OrchestratorError::NotEditable { .. })));
    }
}
