//! HTTP transport over `reqwest`.
//!
//! JSON bodies, bearer authentication. Endpoint paths are resolved
//! against the session's server URL.

use super::SyncTransport;
use crate::error::TransportError;
use crate::session::Session;
use ampli_sync_types::{MigrationReport, PushRequest, SyncId, SyncPage};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Endpoint paths relative to the server URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpEndpoints {
    /// Receives the outbound packet (POST).
    #[serde(default = "default_push_path")]
    pub push: String,
    /// Serves the next page for a table (GET).
    #[serde(default = "default_pull_path")]
    pub pull: String,
    /// Acknowledges an applied page (POST).
    #[serde(default = "default_commit_path")]
    pub commit: String,
    /// Records a migration outcome (POST).
    #[serde(default = "default_migration_result_path")]
    pub migration_result: String,
}

fn default_push_path() -> String {
    "Sync/SendChanges".to_string()
}

fn default_pull_path() -> String {
    "Sync/ReceiveChanges".to_string()
}

fn default_commit_path() -> String {
    "Sync/CommitSync".to_string()
}

fn default_migration_result_path() -> String {
    "Sync/MigrationResult".to_string()
}

impl Default for HttpEndpoints {
    fn default() -> Self {
        Self {
            push: default_push_path(),
            pull: default_pull_path(),
            commit: default_commit_path(),
            migration_result: default_migration_result_path(),
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpConfig {
    /// Per-request timeout; none by default.
    pub timeout: Option<Duration>,
    /// Endpoint paths.
    pub endpoints: HttpEndpoints,
}

/// Transport talking to the sync server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoints: HttpEndpoints,
}

impl HttpTransport {
    /// Create a transport.
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoints: config.endpoints,
        })
    }

    /// Build the URL for an endpoint path.
    pub fn endpoint_url(&self, session: &Session, path: &str) -> String {
        format!(
            "{}/{}",
            session.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Pass successful responses through, turn anything else into an error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn push_changes(
        &self,
        session: &Session,
        request: &PushRequest,
    ) -> Result<(), TransportError> {
        let url = self.endpoint_url(session, &self.endpoints.push);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.access_token)
            .query(&[("deviceId", session.device_id.as_str())])
            .json(request)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn pull_page(&self, session: &Session, table: &str) -> Result<SyncPage, TransportError> {
        let url = self.endpoint_url(session, &self.endpoints.pull);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&session.access_token)
            .query(&[("table", table), ("deviceId", session.device_id.as_str())])
            .send()
            .await?;

        // The server answers with an array; the page is its first element
        let pages: Vec<SyncPage> = check_status(response).await?.json().await?;
        pages
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::EmptyPullResponse {
                table: table.to_string(),
            })
    }

    async fn commit_sync(&self, session: &Session, sync_id: SyncId) -> Result<(), TransportError> {
        let url = self.endpoint_url(session, &self.endpoints.commit);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.access_token)
            .query(&[("syncId", sync_id.value())])
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn report_migration_result(
        &self,
        session: &Session,
        report: &MigrationReport,
    ) -> Result<(), TransportError> {
        let url = self.endpoint_url(session, &self.endpoints.migration_result);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.access_token)
            .json(report)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}
