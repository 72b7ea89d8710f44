//! Chat-completions client implementing the gateway.
//!
//! Speaks the OpenAI-compatible protocol used by OpenRouter and OpenAI:
//! - plain completions for classification, clarification and review
//! - forced function calling for structured component generation

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::config::ModelConfig;
use crate::error::{GatewayError, Result};
use crate::gateway::LlmGateway;
use crate::message::Message;
use crate::tool::ToolDefinition;

/// Gateway client for chat-completions providers.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    config: ModelConfig,
}

impl OpenRouterClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>, config: ModelConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GatewayError::Configuration("API key is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GatewayError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Create a client reading the key from the provider's environment variable.
    pub fn from_env(config: ModelConfig) -> Result<Self> {
        let var = config.provider.api_key_env();
        let api_key = std::env::var(var).map_err(|_| {
            GatewayError::Configuration(format!("Missing {} environment variable", var))
        })?;
        Self::new(api_key, config)
    }

    /// Model configuration in use.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        trace!(model = %request.model, messages = request.messages.len(), "Sending chat request");

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "https://github.com/ui-alchemy/ui-alchemy")
            .header("X-Title", "UI Alchemy")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.config.request_timeout())
                } else {
                    GatewayError::Transient(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, retry_after, body));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(format!("Failed to parse response: {}", e)))?;

        debug!(
            "Chat response received: {} tokens used",
            response.usage.as_ref().map_or(0, |u| u.total_tokens)
        );

        Ok(response)
    }

    fn request(&self, messages: &[Message]) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatMessage::from_message).collect(),
            tools: None,
            tool_choice: None,
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        }
    }
}

#[async_trait]
impl LlmGateway for OpenRouterClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let response = self.chat(&self.request(messages)).await?;
        let message = response
            .message()
            .ok_or_else(|| GatewayError::Malformed("response has no choices".into()))?;
        Ok(message.content.clone().unwrap_or_default())
    }

    async fn complete_with_tool(
        &self,
        messages: &[Message],
        tool: &ToolDefinition,
    ) -> Result<Option<Value>> {
        let mut request = self.request(messages);
        request.tools = Some(vec![ChatTool::from_definition(tool)]);
        request.tool_choice = Some(forced_tool_choice(&tool.name));

        let response = self.chat(&request).await?;
        let Some(call) = response.tool_call(&tool.name) else {
            warn!(tool = %tool.name, "Model answered without the required tool call");
            return Ok(None);
        };

        serde_json::from_str(&call.function.arguments)
            .map(Some)
            .map_err(|e| GatewayError::Malformed(format!("Invalid tool arguments JSON: {}", e)))
    }
}

/// Map a non-success HTTP status onto the gateway taxonomy.
fn error_for_status(status: StatusCode, retry_after: Option<u64>, body: String) -> GatewayError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited { retry_after },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::Unauthorized(format!("provider returned {}: {}", status, body))
        }
        _ => GatewayError::Transient(format!("provider error {}: {}", status, body)),
    }
}

/// `tool_choice` value that makes the named function mandatory.
fn forced_tool_choice(name: &str) -> Value {
    json!({
        "type": "function",
        "function": { "name": name }
    })
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<ChatMessage>,

    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatTool>>,

    /// Tool selection policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: String,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Convert from internal Message type.
    pub fn from_message(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

/// Tool definition for the API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTool {
    /// Type of the tool (always "function").
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition.
    pub function: ToolDefinition,
}

impl ChatTool {
    /// Create from internal ToolDefinition.
    pub fn from_definition(def: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: def.clone(),
        }
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion choices.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,

    /// Token usage information.
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    /// Get the first choice's message.
    pub fn message(&self) -> Option<&ResponseMessage> {
        self.choices.first().map(|c| &c.message)
    }

    /// First call of the named function in the first choice.
    pub fn tool_call(&self, name: &str) -> Option<&ChatToolCall> {
        self.message()?
            .tool_calls
            .as_ref()?
            .iter()
            .find(|c| c.function.name == name)
    }
}

/// A choice in the completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// The message for this choice.
    pub message: ResponseMessage,

    /// Finish reason (stop, tool_calls, length, etc.).
    pub finish_reason: Option<String>,
}

/// Message in a completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Text content of the response.
    pub content: Option<String>,

    /// Tool calls the model made.
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

/// Tool call in a response message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatToolCall {
    /// Unique identifier for this tool call.
    pub id: String,

    /// Function details.
    pub function: ChatToolFunction,
}

/// Function details in a tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatToolFunction {
    /// Name of the function called.
    pub name: String,

    /// JSON-encoded arguments.
    pub arguments: String,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    /// Total tokens used.
    pub total_tokens: u32,
}
