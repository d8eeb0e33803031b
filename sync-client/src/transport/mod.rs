//! Transport abstraction for ampli-sync.
//!
//! Four request/response exchanges with the sync server:
//! - `push_changes()` sends every pending local change in one request
//! - `pull_page()` fetches the next page of server changes for a table
//! - `commit_sync()` acknowledges an applied page
//! - `report_migration_result()` records the outcome of one migration
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_page("assets_crew", page);
//! let page = transport.pull_page(&session, "assets_crew").await?;
//! transport.commit_sync(&session, page.sync_id).await?;
//! ```

mod http;
mod mock;

pub use self::http::{HttpConfig, HttpEndpoints, HttpTransport};
pub use mock::MockTransport;

use crate::error::TransportError;
use crate::session::Session;
use ampli_sync_types::{MigrationReport, PushRequest, SyncId, SyncPage};
use async_trait::async_trait;

/// Transport trait for the sync server's endpoints.
///
/// Implementations do not retry; a failed call is surfaced as-is.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Send the outbound packet.
    async fn push_changes(
        &self,
        session: &Session,
        request: &PushRequest,
    ) -> Result<(), TransportError>;

    /// Fetch the next page for a table.
    async fn pull_page(&self, session: &Session, table: &str) -> Result<SyncPage, TransportError>;

    /// Acknowledge that a page was applied.
    async fn commit_sync(&self, session: &Session, sync_id: SyncId) -> Result<(), TransportError>;

    /// Report the outcome of one migration statement.
    async fn report_migration_result(
        &self,
        session: &Session,
        report: &MigrationReport,
    ) -> Result<(), TransportError>;
}
