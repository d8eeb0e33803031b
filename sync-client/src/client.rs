//! SyncClient - the main interface for ampli-sync.
//!
//! # Architecture
//!
//! SyncClient owns a local store and a transport and drives the engines.
//! Decisions about statements and paging come from sync-core.
//!
//! ```text
//! Application → SyncClient → SyncTransport → Server
//!                   ↓
//!               LocalStore (SQLite)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ampli_sync_client::{MockTransport, Session, SqliteStore, SyncClient, SyncConfig};
//!
//! let store = SqliteStore::in_memory().await?;
//! let client = SyncClient::new(store, MockTransport::new(), SyncConfig::default());
//! let session = Session::new("https://sync.example.com", token, device_id);
//!
//! client.push(&session).await?;
//! let outcome = client.pull(&session, |fraction| println!("{:.0}%", fraction * 100.0)).await;
//! ```

use ampli_sync_types::MigrationRecord;

use crate::cancel::CancelFlag;
use crate::config::SyncConfig;
use crate::error::ClientError;
use crate::migration::apply_migrations;
use crate::pull::{pull_all, PullOutcome};
use crate::push::{push_changes, PushSummary};
use crate::scanner::{scan, ScanResult};
use crate::session::Session;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

/// The main sync client.
///
/// Runs are sequential: the caller starts one push, pull or migration at a time.
pub struct SyncClient<S: LocalStore, T: SyncTransport> {
    store: S,
    transport: T,
    config: SyncConfig,
    cancel: CancelFlag,
}

impl<S: LocalStore, T: SyncTransport> SyncClient<S, T> {
    /// Create a new SyncClient.
    pub fn new(store: S, transport: T, config: SyncConfig) -> Self {
        Self {
            store,
            transport,
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Use a caller-owned cancellation flag.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get a handle to the cancellation flag.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Send pending local changes and clear them once accepted.
    pub async fn push(&self, session: &Session) -> Result<PushSummary, ClientError> {
        push_changes(&self.store, &self.transport, session).await
    }

    /// Pull every synchronized table.
    ///
    /// Never stops at the first failing table; check
    /// [`PullOutcome::first_error`].
    pub async fn pull<F>(&self, session: &Session, on_progress: F) -> PullOutcome
    where
        F: FnMut(f64),
    {
        pull_all(
            &self.store,
            &self.transport,
            session,
            &self.config,
            &self.cancel,
            on_progress,
        )
        .await
    }

    /// One sync cycle: push, then pull.
    ///
    /// A failed push aborts the cycle before anything is pulled.
    pub async fn sync<F>(&self, session: &Session, on_progress: F) -> Result<PullOutcome, ClientError>
    where
        F: FnMut(f64),
    {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        self.push(session).await?;
        Ok(self.pull(session, on_progress).await)
    }

    /// Apply server-issued migrations in order.
    pub async fn apply_migrations(
        &self,
        session: &Session,
        migrations: &[MigrationRecord],
    ) -> Result<usize, ClientError> {
        apply_migrations(&self.store, &self.transport, session, migrations).await
    }

    /// Scan local state without sending anything.
    pub async fn pending(&self) -> Result<ScanResult, ClientError> {
        Ok(scan(&self.store).await?)
    }

    /// Get a reference to the local store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::transport::MockTransport;
    use ampli_sync_types::Statement;

    fn session() -> Session {
        Session::new("http://mock", "token", "device-1")
    }

    async fn client() -> SyncClient<SqliteStore, MockTransport> {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .execute_batch(&[
                Statement::new(
                    "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, mergeupdate INTEGER DEFAULT 0, rowid TEXT)",
                ),
                Statement::new("INSERT INTO items (id, name) VALUES (1, 'local')"),
            ])
            .await
            .unwrap();
        SyncClient::new(store, MockTransport::new(), SyncConfig::default())
    }

    #[tokio::test]
    async fn sync_pushes_then_pulls() {
        let client = client().await;

        let outcome = client.sync(&session(), |_| {}).await.unwrap();

        assert!(outcome.is_ok());
        assert_eq!(client.transport().pushes().len(), 1);
        assert_eq!(client.transport().pulls(), vec!["items"]);
    }

    #[tokio::test]
    async fn failed_push_skips_pull() {
        let client = client().await;
        client.transport().fail_next_push("offline");

        let result = client.sync(&session(), |_| {}).await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
        assert!(client.transport().pulls().is_empty());
    }

    #[tokio::test]
    async fn pending_reports_without_sending() {
        let client = client().await;

        let pending = client.pending().await.unwrap();

        assert_eq!(pending.request.insert_count(), 1);
        assert!(client.transport().pushes().is_empty());
    }

    #[tokio::test]
    async fn shared_cancel_flag_stops_sync() {
        let cancel = CancelFlag::new();
        let client = client().await.with_cancel_flag(cancel.clone());
        cancel.cancel();

        let result = client.sync(&session(), |_| {}).await;

        assert!(matches!(result, Err(ClientError::Cancelled)));
        assert!(client.cancel_flag().is_cancelled());
        assert!(client.transport().pushes().is_empty());
    }
}
