//! The LLM gateway capability.
//!
//! Everything that talks to a model goes through [`LlmGateway`]. The
//! controller and each agent receive the gateway explicitly, so tests swap
//! in a scripted double and deployments can scope credentials per session.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::message::Message;
use crate::tool::ToolDefinition;

/// Chat-completion capability consumed by the agents.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Complete `messages` and return the reply text.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Complete `messages` with `tool` bound and its use forced.
    ///
    /// Returns the tool-call arguments, or `None` if the model answered
    /// without calling the tool.
    async fn complete_with_tool(
        &self,
        messages: &[Message],
        tool: &ToolDefinition,
    ) -> Result<Option<Value>>;
}
