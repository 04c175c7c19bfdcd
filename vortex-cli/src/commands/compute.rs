//! Compute Commands
//!
//! Operations served by `POST /ai/compute`.

use clap::Subcommand;

/// Compute subcommands
#[derive(Subcommand, Debug)]
pub enum ComputeCommands {
    /// Price and market fit of an artwork
    Analyze {
        /// Artwork data as a JSON object
        #[arg(short, long, default_value = "{}")]
        data: String,
    },

    /// Business strategy recommendations
    Strategy {
        /// Business data as a JSON object
        #[arg(short, long, default_value = "{}")]
        data: String,
    },
}
