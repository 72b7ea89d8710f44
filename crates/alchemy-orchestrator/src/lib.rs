//! Session orchestration for UI Alchemy.
//!
//! [`SessionController`] is the state machine that turns a component request
//! into a reviewed component, suspending whenever it needs the user to answer
//! follow-up questions. [`SessionService`] wraps it with persistence, expiry
//! and per-session serialization so a suspended session can be resumed by a
//! later request or a later process.

pub mod config;
pub mod controller;
pub mod error;
pub mod routing;
pub mod service;

pub use config::ControllerConfig;
pub use controller::SessionController;
pub use error::{OrchestratorError, Result};
pub use routing::Next;
pub use service::{SessionService, DEFAULT_SESSION_TTL};
