//! Time tracker CLI library.
//!
//! This crate provides the `tally` command-line interface: category
//! management, statistics queries, and the interactive timer session.

mod cli;
pub mod commands;
mod config;

pub use cli::{CategoryAction, Cli, Commands, StatsQuery};
pub use config::Config;
