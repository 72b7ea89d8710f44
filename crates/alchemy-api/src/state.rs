//! Application state shared across handlers.

use std::sync::Arc;

use alchemy_orchestrator::SessionService;

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Session service driving every conversation.
    pub sessions: Arc<SessionService>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(config: ApiConfig, sessions: Arc<SessionService>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
        }
    }
}
