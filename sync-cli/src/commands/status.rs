//! Show pending local changes (no network).

use ampli_sync_client::scanner::{scan, synced_tables};
use anyhow::{Context, Result};

use super::open_store;
use crate::config::Config;

/// Run the status command.
pub async fn run(config: &Config) -> Result<()> {
    println!("=== ampli-sync status ===");
    println!();
    println!("Server:   {}", config.server.url);
    println!(
        "Device:   {}",
        config.server.device_id.as_deref().unwrap_or("NOT CONFIGURED")
    );
    println!("Database: {}", config.storage.database.display());
    println!();

    let store = open_store(config).await?;
    let tables = synced_tables(&store)
        .await
        .context("Failed to list synchronized tables")?;
    let pending = scan(&store).await.context("Failed to scan local changes")?;

    println!("Synchronized tables: {}", tables.len());
    for packet in &pending.request.changes {
        println!(
            "  {:<32} {} insert(s), {} update(s)",
            packet.table,
            packet.inserts.len(),
            packet.updates.len()
        );
    }
    println!();
    println!("Pending deletes: {}", pending.request.deletes.len());

    if pending.is_empty() {
        println!("Nothing to push.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampli_sync_client::{LocalStore, SqliteStore};
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_on_fresh_database() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database = dir.path().join("device.db");

        let result = run(&config).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn status_with_pending_rows() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database = dir.path().join("device.db");

        let store = SqliteStore::new(&config.storage.database).await.unwrap();
        store
            .execute(
                "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, mergeupdate INTEGER DEFAULT 0, rowid TEXT)",
                &[],
            )
            .await
            .unwrap();
        store
            .execute("INSERT INTO items (id, name) VALUES (1, 'draft')", &[])
            .await
            .unwrap();

        let result = run(&config).await;
        assert!(result.is_ok());
    }
}
