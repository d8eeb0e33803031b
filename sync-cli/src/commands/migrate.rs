//! Apply server-issued migrations from a JSON file.
//!
//! The file holds the array the server sends:
//! `[{"id": "...", "query": "..."}, ...]`.

use ampli_sync_types::MigrationRecord;
use anyhow::{Context, Result};
use std::path::Path;

use super::{connect, session};
use crate::config::Config;

/// Read the migration list.
pub async fn load(path: &Path) -> Result<Vec<MigrationRecord>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read migration file {}", path.display()))?;
    serde_json::from_str(&contents).context("Invalid migration file")
}

/// Run the migrate command.
pub async fn run(config: &Config, token: Option<&str>, file: &Path) -> Result<()> {
    let migrations = load(file).await?;
    let session = session(config, token)?;
    let client = connect(config).await?;

    println!("Applying {} migration(s)...", migrations.len());

    let applied = client
        .apply_migrations(&session, &migrations)
        .await
        .context("Migration failed; remaining statements were not run")?;

    println!("Applied {} migration(s).", applied);
    Ok(())
}
