//! Command execution.

use std::sync::Arc;
use std::time::Duration;

use alchemy_agent::{ModelConfig, OpenRouterClient, RetryPolicy, SystemInstructions};
use alchemy_api::{serve, ApiConfig, AppState};
use alchemy_orchestrator::{
    ControllerConfig, SessionController, SessionService, DEFAULT_SESSION_TTL,
};
use alchemy_persistence::FileSessionStore;
use tracing::info;

use crate::chat::ChatConsole;
use crate::cli::{Cli, Commands};

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Run the selected command; no command starts an interactive chat.
pub fn execute(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let command = cli
        .command
        .clone()
        .unwrap_or(Commands::Chat { description: None });

    match command {
        Commands::Serve {
            host,
            port,
            cors_origins,
            session_ttl_hours,
        } => {
            let config = ApiConfig::new(host, port)
                .with_cors_origins(cors_origins)
                .with_session_ttl(Duration::from_secs(session_ttl_hours * 60 * 60));
            let sessions = Arc::new(build_service(&cli, config.session_ttl)?);

            runtime.block_on(async move {
                sessions.purge_expired().await?;
                serve(AppState::new(config, sessions)).await?;
                Ok::<(), Box<dyn std::error::Error>>(())
            })
        }
        Commands::Chat { description } => {
            let sessions = Arc::new(build_service(&cli, DEFAULT_SESSION_TTL)?);
            let mut console =
                ChatConsole::new(sessions, runtime.handle().clone(), &cli.state_dir())?;
            console.run(description)
        }
    }
}

/// Wire the gateway, controller and file store from CLI settings.
pub fn build_service(cli: &Cli, session_ttl: Duration) -> Result<SessionService> {
    let model = ModelConfig::new(&cli.model).with_provider(cli.provider);
    let retry = RetryPolicy::default().with_call_timeout(Some(model.request_timeout()));
    let gateway = Arc::new(OpenRouterClient::from_env(model)?);

    let config = ControllerConfig::default()
        .with_schema(cli.schema)
        .with_instructions(SystemInstructions::load(cli.instructions.as_deref()));
    let controller = SessionController::with_retry_policy(gateway, config, retry);

    let state_dir = cli.state_dir();
    info!(
        state_dir = %state_dir.display(),
        model = %cli.model,
        provider = %cli.provider,
        "Session service ready"
    );
    let store = Arc::new(FileSessionStore::new(state_dir));

    Ok(SessionService::new(controller, store).with_ttl(Some(session_ttl)))
}
