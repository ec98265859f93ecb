use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_cli::commands::{category, stats, track};
use tally_cli::{CategoryAction, Cli, Commands, Config, StatsQuery};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(tally_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = tally_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Category { action }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                CategoryAction::Add(args) => category::add(&mut out, &db, args)?,
                CategoryAction::List { all, json } => category::list(&mut out, &db, *all, *json)?,
                CategoryAction::Update(args) => category::update(&mut out, &db, args)?,
                CategoryAction::Remove { id } => category::remove(&mut out, &db, *id)?,
            }
        }
        Some(Commands::Stats { query }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match query {
                StatsQuery::Daily { date, json } => {
                    stats::daily(&mut out, &db, date.as_deref(), *json)?;
                }
                StatsQuery::Range { start, end, json } => {
                    stats::range(&mut out, &db, start, end, *json)?;
                }
            }
        }
        Some(Commands::Track) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let stdin = std::io::stdin();
            track::run(&mut stdin.lock(), &mut out, &db)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(out)?;
        }
    }

    Ok(())
}
