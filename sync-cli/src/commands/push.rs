//! Push local changes to the server.

use anyhow::{Context, Result};

use super::{connect, session};
use crate::config::Config;

/// Run the push command.
pub async fn run(config: &Config, token: Option<&str>) -> Result<()> {
    let session = session(config, token)?;
    let client = connect(config).await?;

    println!("Pushing local changes to {}...", session.server_url);

    let summary = client
        .push(&session)
        .await
        .context("Push failed; local changes are kept for the next attempt")?;

    println!("Push successful!");
    println!();
    println!("  Tables:  {}", summary.tables);
    println!("  Inserts: {}", summary.inserts);
    println!("  Updates: {}", summary.updates);
    println!("  Deletes: {}", summary.deletes);

    Ok(())
}
