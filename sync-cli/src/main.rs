//! # ampli-sync
//!
//! Command-line driver for the ampli-sync engine.
//!
//! ## Commands
//!
//! - `push`: Send pending local changes to the server
//! - `pull`: Apply server changes to the local database
//! - `sync`: Push, then pull
//! - `migrate`: Apply a JSON list of server migrations
//! - `status`: Show pending local changes (no network)
//!
//! ## Example
//!
//! ```bash
//! export AMPLI_SYNC_TOKEN=...
//!
//! # Full cycle with the settings in ampli-sync.toml
//! ampli-sync sync
//!
//! # What would be pushed
//! ampli-sync status
//!
//! # Apply migrations fetched from the server
//! ampli-sync --config device.toml migrate migrations.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{migrate, pull, push, status, sync};
use config::Config;

/// Command-line driver for ampli-sync.
#[derive(Parser, Debug)]
#[command(name = "ampli-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, default_value = "ampli-sync.toml")]
    config: PathBuf,

    /// Bearer token for the sync server
    #[arg(long, global = true, env = "AMPLI_SYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send pending local changes to the server
    Push,

    /// Apply server changes to the local database
    Pull,

    /// Push, then pull
    Sync,

    /// Apply a JSON list of server migrations
    Migrate {
        /// File holding `[{"id": ..., "query": ...}]`
        file: PathBuf,
    },

    /// Show pending local changes
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config).context("Failed to load configuration")?;
    let token = cli.token.as_deref();

    match cli.command {
        Commands::Push => push::run(&config, token).await?,
        Commands::Pull => pull::run(&config, token).await?,
        Commands::Sync => sync::run(&config, token).await?,
        Commands::Migrate { file } => migrate::run(&config, token, &file).await?,
        Commands::Status => status::run(&config).await?,
    }

    Ok(())
}
