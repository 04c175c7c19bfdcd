//! Analytics Commands
//!
//! Reports served by `POST /analytics`.

use chrono::NaiveDate;
use clap::Subcommand;

/// Analytics subcommands
#[derive(Subcommand, Debug)]
pub enum AnalyticsCommands {
    /// Marketplace totals for a date range
    Overview {
        /// Start date (YYYY-MM-DD); defaults to 30 days before the end
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Performance of a single artist
    Artist {
        /// Artist ID
        #[arg(short, long)]
        id: String,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Sales series grouped by day, week or month
    Sales {
        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        /// Grouping (day, week, month)
        #[arg(short, long, default_value = "day")]
        group_by: String,
    },
}
