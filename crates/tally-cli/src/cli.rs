//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::category::{AddArgs, UpdateArgs};

/// Personal time tracker.
///
/// Tracks one timer at a time, tags elapsed time with a category, and
/// reports daily and ranged totals.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage categories.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Aggregate recorded time.
    Stats {
        #[command(subcommand)]
        query: StatsQuery,
    },

    /// Run an interactive timer session.
    ///
    /// The timer lives in this process only; quitting while a timer is
    /// running discards the in-flight session without recording it.
    Track,
}

/// Category management actions.
#[derive(Debug, Subcommand)]
pub enum CategoryAction {
    /// Create a category.
    Add(AddArgs),

    /// List categories in creation order.
    List {
        /// Include deactivated categories.
        #[arg(long)]
        all: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Update a category's name, color, or active state.
    Update(UpdateArgs),

    /// Deactivate a category (logical delete; history is kept).
    Remove {
        /// Category id, as shown by `category list`.
        id: i64,
    },
}

/// Statistics queries.
#[derive(Debug, Subcommand)]
pub enum StatsQuery {
    /// Totals and per-category breakdown for one date.
    Daily {
        /// Date as YYYY-MM-DD; defaults to today.
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Totals and breakdowns over an inclusive date range.
    Range {
        /// Range start as YYYY-MM-DD.
        start: String,

        /// Range end as YYYY-MM-DD (inclusive).
        end: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
