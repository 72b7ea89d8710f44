//! Code generator.

use std::sync::Arc;

use alchemy_models::{ComponentData, SessionState};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::gateway::LlmGateway;
use crate::instructions::SystemInstructions;
use crate::prompts;
use crate::retry::RetryPolicy;
use crate::tool::ToolDefinition;

/// What a generation call produced.
#[derive(Debug)]
pub enum Generation {
    /// A component matching the session's schema.
    Component(ComponentData),
    /// The model answered without usable structured data.
    Malformed(String),
    /// The call itself failed after retries.
    Failed(GatewayError),
}

/// Generates components through the forced component tool.
pub struct CodeGenerator {
    gateway: Arc<dyn LlmGateway>,
    retry: RetryPolicy,
    instructions: Arc<SystemInstructions>,
}

impl CodeGenerator {
    /// Create a generator.
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

    /// Generate, or repair when the state carries reviewer feedback.
    pub async fn generate(&self, state: &SessionState) -> Generation {
        let tool = ToolDefinition::component(state.schema);
        let messages = prompts::generation(&self.instructions, state, &tool.name);

        let outcome = self
            .retry
            .run("generate", || self.gateway.complete_with_tool(&messages, &tool))
            .await;

        match outcome.value {
            Ok(Some(args)) => match ComponentData::from_tool_args(state.schema, &args) {
                Ok(component) => {
                    debug!(session_id = %state.id, schema = %state.schema, "Component generated");
                    Generation::Component(component)
                }
                Err(e) => {
                    warn!(session_id = %state.id, error = %e, "Tool arguments rejected");
                    Generation::Malformed(e.to_string())
                }
            },
            Ok(None) => Generation::Malformed(format!("the model did not call {}", tool.name)),
            Err(GatewayError::Malformed(reason)) => Generation::Malformed(reason),
            Err(e) => Generation::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallKind, MockGateway, Reply};
    use alchemy_models::{ComponentSchema, SessionId};
    use serde_json::json;

    fn generator(gateway: &Arc<MockGateway>) -> CodeGenerator {
        CodeGenerator::new(
            gateway.clone(),
            RetryPolicy::default(),
            Arc::new(SystemInstructions::default()),
        )
    }

    fn state(schema: ComponentSchema) -> SessionState {
        SessionState::new(SessionId::from("s"), "A blue Save button", schema)
    }

    #[tokio::test]
    async fn test_generates_full_component() {
        let gateway = Arc::new(MockGateway::new(vec![Reply::tool(json!({
            "install_script": "npm i @mui/material",
            "imports": "import Button from '@mui/material/Button';",
            "code": "export default function MUIComponent() { return <Button>Save</Button>; }",
            "description": "A save button",
        }))]));

        let generation = generator(&gateway).generate(&state(ComponentSchema::Full)).await;

        let component = match generation {
            Generation::Component(component) => component,
            other => panic!("expected a component, got {:?}", other),
        };
        assert_eq!(component.description.as_deref(), Some("A save button"));

        let calls = gateway.calls();
        assert_eq!(calls[0].kind, CallKind::Tool("ui_gen_function".into()));
    }

    #[tokio::test]
    async fn test_missing_field_is_malformed() {
        let gateway = Arc::new(MockGateway::new(vec![Reply::tool(json!({"code": "<div/>"}))]));

        let generation = generator(&gateway).generate(&state(ComponentSchema::Full)).await;

        assert!(matches!(generation, Generation::Malformed(_)));
    }

    #[tokio::test]
    async fn test_code_only_schema() {
        let gateway = Arc::new(MockGateway::new(vec![Reply::tool(json!({"code": "<div/>"}))]));

        let generation = generator(&gateway)
            .generate(&state(ComponentSchema::CodeOnly))
            .await;

        assert!(matches!(generation, Generation::Component(c) if c.code == "<div/>"));
        assert_eq!(gateway.calls()[0].kind, CallKind::Tool("UiGenTool".into()));
    }

    #[tokio::test]
    async fn test_no_tool_call_is_malformed() {
        let gateway = Arc::new(MockGateway::new(vec![Reply::no_tool()]));

        let generation = generator(&gateway).generate(&state(ComponentSchema::Full)).await;

        assert!(matches!(
            generation,
            Generation::Malformed(reason) if reason.contains("ui_gen_function")
        ));
    }

    #[tokio::test]
    async fn test_fatal_error_fails() {
        let gateway = Arc::new(MockGateway::new(vec![Reply::error(
            GatewayError::Unauthorized("revoked".into()),
        )]));

        let generation = generator(&gateway).generate(&state(ComponentSchema::Full)).await;

        assert!(matches!(generation, Generation::Failed(e) if e.is_fatal()));
        assert_eq!(gateway.calls().len(), 1);
    }
}
