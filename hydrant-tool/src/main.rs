mod commands;
mod config;
mod error;
mod store;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{FixtureCommand, UsageCommand};
use crate::config::{load_config, load_config_from};
use crate::store::{StorageType, open_fixture_store};

#[derive(Parser)]
#[command(name = "hyd")]
#[command(about = "Household water fixtures and usage data", long_about = None)]
struct Cli {
    /// Storage type: dir or rocks
    #[arg(long, global = true, value_enum)]
    storage_type: Option<StorageType>,

    /// Path to the fixture storage
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Config file (defaults to ~/.config/hydrant/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the fixtures in your home
    #[command(subcommand)]
    Fixture(FixtureCommand),

    /// Inspect the usage datasets
    #[command(subcommand)]
    Usage(UsageCommand),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Fixture(command) => {
            let (storage_type, storage_path) = config.resolve_storage(cli.storage_type, cli.storage);
            let mut store = open_fixture_store(storage_type, &storage_path)?;
            if let Some(warning) = store.load_warning() {
                eprintln!("warning: {warning}");
            }

            commands::fixture::run(&mut store, command, &mut io::stdin().lock(), &mut out)?;
        }
        Command::Usage(command) => {
            let now = chrono::Local::now().naive_local();
            commands::usage::run(command, &config, now, &mut out)?;
        }
    }

    Ok(())
}
