//! One full cycle: push, then pull.

use anyhow::{Context, Result};

use super::{connect, pull, session};
use crate::config::Config;

/// Run the sync command.
pub async fn run(config: &Config, token: Option<&str>) -> Result<()> {
    let session = session(config, token)?;
    let client = connect(config).await?;

    println!("Syncing with {}...", session.server_url);

    let outcome = client
        .sync(&session, |fraction| {
            tracing::debug!(percent = (fraction * 100.0).round(), "pull progress");
        })
        .await
        .context("Push failed; nothing was pulled")?;

    pull::report(&outcome);
    outcome.into_result()?;

    println!("Sync complete.");
    Ok(())
}
