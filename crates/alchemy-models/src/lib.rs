//! Core data models for UI Alchemy.
//!
//! This crate provides the types threaded through every step of a component
//! generation session: the [`SessionState`] itself, the patches that update
//! it, the bounded clarification history, and the structured component
//! produced by the code generator.

pub mod component;
pub mod history;
pub mod ids;
pub mod record;
pub mod state;

// Re-export main types
pub use component::{ComponentData, ComponentError, ComponentSchema};
pub use history::{ConversationHistory, Exchange, HistoryUpdate, DEFAULT_HISTORY_KEEP};
pub use ids::SessionId;
pub use record::SessionRecord;
pub use state::{SessionState, StatePatch, Status};
