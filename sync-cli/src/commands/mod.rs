//! CLI command implementations.

pub mod migrate;
pub mod pull;
pub mod push;
pub mod status;
pub mod sync;

use ampli_sync_client::{HttpTransport, Session, SqliteStore, SyncClient};
use anyhow::{Context, Result};

use crate::config::Config;

/// Client over the configured database and server.
pub type CliClient = SyncClient<SqliteStore, HttpTransport>;

/// Open the configured database.
pub async fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::new(&config.storage.database)
        .await
        .with_context(|| {
            format!(
                "Failed to open database {}",
                config.storage.database.display()
            )
        })
}

/// Build a client talking to the configured server.
pub async fn connect(config: &Config) -> Result<CliClient> {
    let store = open_store(config).await?;
    let transport =
        HttpTransport::new(config.http_config()).context("Failed to create HTTP transport")?;
    Ok(SyncClient::new(store, transport, config.sync_config()))
}

/// Build the session for a networked command.
pub fn session(config: &Config, token: Option<&str>) -> Result<Session> {
    let token = token
        .filter(|t| !t.is_empty())
        .context("No access token. Pass --token or set AMPLI_SYNC_TOKEN.")?;
    let device_id = config
        .server
        .device_id
        .as_deref()
        .filter(|d| !d.is_empty())
        .context("No device_id configured. Set [server] device_id in the config file.")?;
    Ok(Session::new(&config.server.url, token, device_id))
}
