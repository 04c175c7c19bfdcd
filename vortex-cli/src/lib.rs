//! VORTEX CLI - Command Line Interface
//!
//! Command-line access to the VORTEX AI Marketplace: the SaaS backend
//! client, local TOLA ledger tools, and the API server launcher.
//!
//! # Usage
//!
//! ```text
//! vortex [OPTIONS] <COMMAND>
//!
//! Commands:
//!   init         Create the local database schema
//!   start        Start the VORTEX API server
//!   health       Check health of the SaaS backend
//!   predictions  Market predictions
//!   analytics    Marketplace analytics
//!   compute      AI compute operations
//!   balance      Show a user's TOLA balance from the local ledger
//!   award        Award TOLA points to a user in the local ledger
//!   maintenance  Purge expired cache rows and old analytics
//!
//! Options:
//!   -a, --api-url <URL>    SaaS API base URL [env: VORTEX_BASE_URL]
//!   -k, --api-key <KEY>    SaaS API key [env: VORTEX_API_KEY]
//!       --db-path <PATH>   Local database path
//!   -f, --format <FORMAT>  Output format (json, table, plain) [default: table]
//!   -v, --verbose          Enable verbose output
//! ```
//!
//! # Examples
//!
//! ```text
//! vortex analytics artist --id 42 --start 2024-01-01
//! vortex compute analyze --data '{"price": 12.5, "style": "surreal"}'
//! vortex --db-path ./vortex.db award 7 100 --reason welcome
//! ```
//!
//! # Exit codes
//!
//! `0` success, `1` general failure, `2` configuration or argument error,
//! `3` connection failure, `4` API error response.

pub mod client;
pub mod commands;
pub mod error;
pub mod handler;
pub mod output;

pub use client::{ApiClientConfig, VortexApiClient, DEFAULT_BASE_URL};
pub use commands::{Cli, Commands, OutputFormat};
pub use error::{CliError, CliResult, ClientError, ClientResult};

/// VORTEX CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
