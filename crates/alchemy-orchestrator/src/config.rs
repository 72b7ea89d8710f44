//! Controller configuration.

use std::sync::Arc;

use alchemy_agent::SystemInstructions;
use alchemy_models::{ComponentSchema, DEFAULT_HISTORY_KEEP};

/// Default validation attempts per round.
pub const DEFAULT_MAX_VALIDATION_ATTEMPTS: u32 = 3;

/// Reply that stops clarification and forces generation.
pub const DEFAULT_FORCE_GENERATE_SENTINEL: &str = "generate";

/// Knobs for the session state machine.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Validation cycles allowed before failing closed.
    pub max_validation_attempts: u32,
    /// Exchanges kept when history is pruned before generation.
    pub history_keep: usize,
    /// Component field set for new sessions.
    pub schema: ComponentSchema,
    /// Clarification reply that forces generation.
    pub force_generate_sentinel: String,
    /// System prompt shared by all agents.
    pub instructions: Arc<SystemInstructions>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_validation_attempts: DEFAULT_MAX_VALIDATION_ATTEMPTS,
            history_keep: DEFAULT_HISTORY_KEEP,
            schema: ComponentSchema::default(),
            force_generate_sentinel: DEFAULT_FORCE_GENERATE_SENTINEL.to_string(),
            instructions: Arc::new(SystemInstructions::default()),
        }
    }
}

impl ControllerConfig {
    /// Set the validation ceiling (at least one).
    pub fn with_max_validation_attempts(mut self, attempts: u32) -> Self {
        self.max_validation_attempts = attempts.max(1);
        self
    }

    /// Set how many exchanges survive pruning.
    pub fn with_history_keep(mut self, keep: usize) -> Self {
        self.history_keep = keep;
        self
    }

    /// Set the component schema.
    pub fn with_schema(mut self, schema: ComponentSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the force-generate reply.
    pub fn with_force_generate_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.force_generate_sentinel = sentinel.into();
        self
    }

    /// Set the system instructions.
    pub fn with_instructions(mut self, instructions: SystemInstructions) -> Self {
        self.instructions = Arc::new(instructions);
        self
    }
}
