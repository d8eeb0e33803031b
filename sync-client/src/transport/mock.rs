//! Mock transport for testing.
//!
//! Serves queued pages per table and captures everything sent for verification.

use super::SyncTransport;
use crate::error::TransportError;
use crate::session::Session;
use ampli_sync_types::{MigrationReport, PushRequest, SyncId, SyncPage};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock transport for testing.
///
/// A table with no queued page answers "no changes". Clones share state.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    pages: HashMap<String, VecDeque<SyncPage>>,
    pushes: Vec<PushRequest>,
    pulls: Vec<String>,
    commits: Vec<SyncId>,
    reports: Vec<MigrationReport>,
    fail_next_push: Option<String>,
    fail_next_pull: HashMap<String, String>,
    fail_next_commit: Option<String>,
    fail_next_report: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page to be returned by the next `pull_page()` for the table.
    pub fn queue_page(&self, table: &str, page: SyncPage) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .pages
            .entry(table.to_string())
            .or_default()
            .push_back(page);
    }

    /// Get every pushed packet.
    pub fn pushes(&self) -> Vec<PushRequest> {
        let inner = self.inner.lock().unwrap();
        inner.pushes.clone()
    }

    /// Get the last pushed packet.
    pub fn last_push(&self) -> Option<PushRequest> {
        let inner = self.inner.lock().unwrap();
        inner.pushes.last().cloned()
    }

    /// Get the tables pulled, one entry per page request.
    pub fn pulls(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.pulls.clone()
    }

    /// Get every acknowledged SyncId.
    pub fn commits(&self) -> Vec<SyncId> {
        let inner = self.inner.lock().unwrap();
        inner.commits.clone()
    }

    /// Get every migration report.
    pub fn reports(&self) -> Vec<MigrationReport> {
        let inner = self.inner.lock().unwrap();
        inner.reports.clone()
    }

    /// Cause the next push_changes() to fail with the given error.
    pub fn fail_next_push(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_push = Some(error.to_string());
    }

    /// Cause the next pull_page() for a table to fail with the given error.
    pub fn fail_next_pull(&self, table: &str, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .fail_next_pull
            .insert(table.to_string(), error.to_string());
    }

    /// Cause the next commit_sync() to fail with the given error.
    pub fn fail_next_commit(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_commit = Some(error.to_string());
    }

    /// Cause the next report_migration_result() to fail with the given error.
    pub fn fail_next_report(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_report = Some(error.to_string());
    }

    /// Clear all state (queues, captures, pending failures).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl SyncTransport for MockTransport {
    async fn push_changes(
        &self,
        _session: &Session,
        request: &PushRequest,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_push.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.pushes.push(request.clone());
        Ok(())
    }

    async fn pull_page(&self, _session: &Session, table: &str) -> Result<SyncPage, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.pulls.push(table.to_string());

        if let Some(error) = inner.fail_next_pull.remove(table) {
            return Err(TransportError::ConnectionFailed(error));
        }

        Ok(inner
            .pages
            .get_mut(table)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(SyncPage::no_changes))
    }

    async fn commit_sync(&self, _session: &Session, sync_id: SyncId) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_commit.take() {
            return Err(TransportError::Status {
                status: 500,
                body: error,
            });
        }

        inner.commits.push(sync_id);
        Ok(())
    }

    async fn report_migration_result(
        &self,
        _session: &Session,
        report: &MigrationReport,
    ) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_report.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.reports.push(report.clone());
        Ok(())
    }
}
