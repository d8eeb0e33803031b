//! Pull server changes into the local database.

use ampli_sync_client::PullOutcome;
use anyhow::Result;

use super::{connect, session};
use crate::config::Config;

/// Run the pull command.
pub async fn run(config: &Config, token: Option<&str>) -> Result<()> {
    let session = session(config, token)?;
    let client = connect(config).await?;

    println!("Pulling changes from {}...", session.server_url);

    let outcome = client
        .pull(&session, |fraction| {
            tracing::debug!(percent = (fraction * 100.0).round(), "pull progress");
        })
        .await;

    report(&outcome);
    outcome.into_result()?;
    Ok(())
}

/// Print per-table results.
pub fn report(outcome: &PullOutcome) {
    let failed = outcome.failed_tables();

    println!();
    for table in &outcome.tables {
        let tally = table.tally();
        if failed.contains(&table.table.as_str()) {
            println!("  {:<32} FAILED", table.table);
        } else {
            println!(
                "  {:<32} {} page(s), {} record(s)",
                table.table, tally.pages, tally.records
            );
        }
    }
    println!();
    println!("  Records applied: {}", outcome.records_applied());

    if let Some(err) = &outcome.first_error {
        println!("  First error:     {}", err);
    }
}
