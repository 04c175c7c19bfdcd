//! VORTEX CLI Entry Point
//!
//! Configuration is loaded from environment variables (via .env file).
//! Command-line arguments override environment variables.

use clap::Parser;
use vortex_cli::{handler, Cli, Commands};
use vortex_engine::{init_logging, LogConfig, LogLevel};

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.verbose || matches!(cli.command, Commands::Start { .. }) {
        let mut config = LogConfig::from_env().with_service_name("vortex-cli");
        if cli.verbose {
            config = config.with_level(LogLevel::Debug);
        }
        if let Err(e) = init_logging(&config) {
            eprintln!("Warning: {}", e);
        }
    }

    if let Err(e) = handler::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
