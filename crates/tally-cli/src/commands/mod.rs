//! CLI subcommand implementations.

pub mod category;
pub mod stats;
pub mod track;
