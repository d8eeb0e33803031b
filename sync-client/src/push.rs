//! Push engine.
//!
//! Scan, send everything in one request, then clear what was sent. If the
//! send fails nothing local changes, so the next push finds the same rows.

use tracing::{debug, info};

use crate::error::ClientError;
use crate::scanner::scan;
use crate::session::Session;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

/// Counts from one push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Tables with pending inserts or updates
    pub tables: usize,
    /// Rows sent as inserts
    pub inserts: usize,
    /// Rows sent as updates
    pub updates: usize,
    /// Deletions sent
    pub deletes: usize,
    /// Cleanup statements executed after acknowledgment
    pub cleared: usize,
}

/// Push all pending local changes.
pub async fn push_changes<S, T>(
    store: &S,
    transport: &T,
    session: &Session,
) -> Result<PushSummary, ClientError>
where
    S: LocalStore + ?Sized,
    T: SyncTransport + ?Sized,
{
    let scanned = scan(store).await?;
    let cleanup = scanned.cleanup();

    let summary = PushSummary {
        tables: scanned.request.changes.len(),
        inserts: scanned.request.insert_count(),
        updates: scanned.request.update_count(),
        deletes: scanned.request.deletes.len(),
        cleared: cleanup.len(),
    };
    debug!(?summary, "sending local changes");

    transport.push_changes(session, &scanned.request).await?;

    // Markers and audit rows go together: one transaction
    store.execute_batch(&cleanup).await?;

    info!(
        tables = summary.tables,
        inserts = summary.inserts,
        updates = summary.updates,
        deletes = summary.deletes,
        "push complete"
    );
    Ok(summary)
}
