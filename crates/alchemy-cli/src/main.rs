//! UI Alchemy CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use alchemy_cli::cli::Cli;
use alchemy_cli::commands;

fn main() {
    // Load .env.local / .env if present (for OPENROUTER_API_KEY etc.)
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
