//! LLM gateway, retry policy and generation agents for UI Alchemy.
//!
//! This crate owns every call to a language model. The session controller
//! in `alchemy-orchestrator` composes the agents defined here; none of them
//! route or persist anything themselves.
//!
//! # Core Types
//!
//! - [`LlmGateway`]: the chat-completion capability (plain and forced-tool)
//! - [`OpenRouterClient`]: gateway over an OpenAI-compatible HTTP API
//! - [`RetryPolicy`]: bounded retry with linear backoff and a per-call deadline
//! - [`RequirementClassifier`], [`ClarificationElicitor`], [`CodeGenerator`],
//!   [`CodeValidator`]: one agent per model-facing step
//! - [`is_affirmative`]: the loose "yes" contract used for verdicts
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use alchemy_agent::{CodeGenerator, ModelConfig, OpenRouterClient, RetryPolicy, SystemInstructions};
//!
//! let gateway = Arc::new(OpenRouterClient::from_env(ModelConfig::default())?);
//! let generator = CodeGenerator::new(
//!     gateway,
//!     RetryPolicy::default(),
//!     Arc::new(SystemInstructions::default()),
//! );
//! let generation = generator.generate(&state).await;
//! ```

pub mod classifier;
pub mod client;
pub mod config;
pub mod elicitor;
pub mod error;
pub mod gateway;
pub mod generator;
pub mod instructions;
pub mod message;
pub mod prompts;
pub mod retry;
pub mod tool;
pub mod validator;
pub mod verdict;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classifier::RequirementClassifier;
pub use client::OpenRouterClient;
pub use config::{ModelConfig, Provider};
pub use elicitor::ClarificationElicitor;
pub use error::{GatewayError, Result};
pub use gateway::LlmGateway;
pub use generator::{CodeGenerator, Generation};
pub use instructions::SystemInstructions;
pub use message::{Message, MessageRole};
pub use retry::{CallOutcome, RetryPolicy};
pub use tool::ToolDefinition;
pub use validator::{CodeValidator, Review};
pub use verdict::is_affirmative;
