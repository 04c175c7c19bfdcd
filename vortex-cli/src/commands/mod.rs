//! CLI Commands Module
//!
//! Command definitions for the VORTEX CLI.

pub mod analytics;
pub mod compute;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::client::DEFAULT_BASE_URL;

/// VORTEX AI Marketplace CLI
#[derive(Parser, Debug)]
#[command(name = "vortex")]
#[command(version)]
#[command(about = "VORTEX AI Marketplace Command Line Interface")]
#[command(long_about = "A command-line tool for the VORTEX AI Marketplace.\n\n\
    Query the SaaS backend for predictions and analytics, manage the local \
    TOLA ledger, and run the marketplace API server.")]
pub struct Cli {
    /// SaaS API base URL
    #[arg(short, long, env = "VORTEX_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// SaaS API key (env: VORTEX_API_KEY)
    #[arg(short = 'k', long, env = "VORTEX_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Local database path; overrides VORTEX_DB_PATH
    #[arg(long)]
    pub db_path: Option<String>,

    /// Output format (json, table, plain)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Table format (human-readable)
    #[default]
    Table,
    /// Plain text
    Plain,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the local database schema
    Init,

    /// Start the VORTEX API server
    Start {
        /// Host to bind to (env: VORTEX_API_HOST)
        #[arg(short = 'H', long, env = "VORTEX_API_HOST", default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on (env: VORTEX_API_PORT)
        #[arg(short, long, env = "VORTEX_API_PORT", default_value = "3000")]
        port: u16,
    },

    /// Check health of the SaaS backend
    Health,

    /// Market predictions
    Predictions {
        /// Predict a single asset instead of categories
        #[arg(long)]
        asset: Option<String>,

        /// Restrict to one category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Marketplace analytics
    #[command(subcommand)]
    Analytics(analytics::AnalyticsCommands),

    /// AI compute operations
    #[command(subcommand)]
    Compute(compute::ComputeCommands),

    /// Show a user's TOLA balance from the local ledger
    Balance {
        /// User ID
        user: u64,
    },

    /// Award TOLA points to a user in the local ledger
    Award {
        /// User ID
        user: u64,
        /// Points to award
        points: Decimal,
        /// Ledger reason
        #[arg(short, long, default_value = "manual_award")]
        reason: String,
    },

    /// Purge expired cache rows and old analytics
    Maintenance {
        /// Delete analytics rows older than this many days
        #[arg(long)]
        analytics_days: Option<u32>,
    },
}

impl Commands {
    /// Commands that run against the local database rather than the SaaS API
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Commands::Init
                | Commands::Start { .. }
                | Commands::Balance { .. }
                | Commands::Award { .. }
                | Commands::Maintenance { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_help() {
        let result = Cli::try_parse_from(["vortex", "--help"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_parse_award() {
        let cli = Cli::try_parse_from(["vortex", "award", "7", "12.5", "--reason", "contest"]).unwrap();
        match cli.command {
            Commands::Award { user, points, reason } => {
                assert_eq!(user, 7);
                assert_eq!(points, Decimal::new(125, 1));
                assert_eq!(reason, "contest");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_analytics_dates() {
        let cli = Cli::try_parse_from([
            "vortex", "analytics", "sales", "--start", "2024-01-01", "--group-by", "week",
        ])
        .unwrap();
        match cli.command {
            Commands::Analytics(analytics::AnalyticsCommands::Sales { start, end, group_by }) => {
                assert_eq!(start.map(|d| d.to_string()).as_deref(), Some("2024-01-01"));
                assert!(end.is_none());
                assert_eq!(group_by, "week");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["vortex", "analytics", "overview", "--start", "soon"]).is_err());
    }

    #[test]
    fn test_local_commands() {
        let cli = Cli::try_parse_from(["vortex", "balance", "3"]).unwrap();
        assert!(cli.command.is_local());
        let cli = Cli::try_parse_from(["vortex", "health"]).unwrap();
        assert!(!cli.command.is_local());
    }
}
