//! HTTP session API for UI Alchemy.
//!
//! Routes:
//! - `POST /sessions`: start a session from a component description
//! - `POST /sessions/:id/messages`: answer the pending follow-up questions
//! - `GET /sessions/:id`: inspect a session without advancing it
//! - `POST /sessions/:id/edit`: request changes to a finished component
//! - `GET /health`: liveness and uptime
//!
//! # Example
//!
//! ```ignore
//! use alchemy_api::{serve, ApiConfig, AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(ApiConfig::default(), Arc::new(sessions));
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{create_router, serve};
pub use state::AppState;
