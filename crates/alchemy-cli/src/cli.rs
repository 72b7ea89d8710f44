//! Command-line interface definition using clap.

use std::path::PathBuf;

use alchemy_agent::Provider;
use alchemy_models::ComponentSchema;
use clap::{Parser, Subcommand};

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "UI_ALCHEMY_STATE_DIR";

const DEFAULT_STATE_DIR: &str = ".ui-alchemy";

/// Version string with git hash and build date, e.g. "0.3.0 (abc1234, 2026-01-29)".
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const BUILD_DATE: &str = env!("BUILD_DATE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// UI Alchemy - conversational UI component generation
#[derive(Parser, Debug)]
#[command(name = "ui-alchemy")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to state directory
    #[arg(short, long, env = STATE_DIR_ENV, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Model identifier passed to the provider
    #[arg(
        short,
        long,
        env = "UI_ALCHEMY_MODEL",
        default_value = "anthropic/claude-3.7-sonnet",
        global = true
    )]
    pub model: String,

    /// LLM provider (openrouter, openai)
    #[arg(long, env = "UI_ALCHEMY_PROVIDER", default_value = "openrouter", global = true)]
    pub provider: Provider,

    /// Component schema (full, code_only)
    #[arg(long, env = "UI_ALCHEMY_SCHEMA", default_value = "full", global = true)]
    pub schema: ComponentSchema,

    /// File with system instructions for every prompt
    #[arg(long, env = "UI_ALCHEMY_INSTRUCTIONS", global = true)]
    pub instructions: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the HTTP session API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = 8000)]
        port: u16,

        /// Allowed CORS origin (repeatable, `*` for any)
        #[arg(long = "cors-origin", default_value = "*")]
        cors_origins: Vec<String>,

        /// Hours of inactivity before a session expires
        #[arg(long, default_value_t = 24)]
        session_ttl_hours: u64,
    },

    /// Describe a component and answer follow-up questions interactively
    Chat {
        /// Component description (prompted for if omitted)
        description: Option<String>,
    },
}

impl Cli {
    /// Returns the state directory path, using default if not specified.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
    }

    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
