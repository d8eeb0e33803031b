//! Error types for sync-client.

use ampli_sync_core::ChangeSetError;
use ampli_sync_types::PayloadError;
use thiserror::Error;

/// Local store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if readable
        body: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// A pull response held no page.
    #[error("invalid pull response for table '{table}': expected non-empty array")]
    EmptyPullResponse {
        /// Table that was requested
        table: String,
    },

    /// Any other HTTP failure.
    #[error("http error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            TransportError::ConnectionFailed(e.to_string())
        } else if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A pull page is missing or has a wrongly typed `Records` object.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] PayloadError),

    /// A pull page could not be turned into statements.
    #[error("{0}")]
    ChangeSet(#[from] ChangeSetError),

    /// The server sent the `initialize table` shorthand.
    #[error("unsupported migration query '{query}' (id {id}): full SQL is required")]
    UnsupportedMigration {
        /// Migration identifier
        id: String,
        /// Offending statement
        query: String,
    },

    /// The caller cancelled the run.
    #[error("sync cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for ClientError {
    fn from(e: sqlx::Error) -> Self {
        ClientError::Store(StoreError::Database(e))
    }
}
