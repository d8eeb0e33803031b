//! # sync-client
//!
//! Offline-first sync engine for ampli-sync.
//!
//! This is the library that applications use to keep a device's SQLite
//! database in step with the sync server.
//!
//! ## Features
//!
//! - **Paged Pull**: per-table pages applied atomically, acknowledged once
//! - **Safe Push**: dirty markers and delete audit rows cleared only after the server accepts them
//! - **Migrations**: server-issued SQL applied in order with per-statement reports
//! - **Pluggable Collaborators**: storage and transport traits (SQLite, HTTP, mock)
//!
//! ## Example
//!
//! ```ignore
//! use ampli_sync_client::{HttpConfig, HttpTransport, Session, SqliteStore, SyncClient, SyncConfig};
//!
//! let store = SqliteStore::new(Path::new("device.db")).await?;
//! let transport = HttpTransport::new(HttpConfig::default())?;
//! let client = SyncClient::new(store, transport, SyncConfig::default());
//!
//! let session = Session::new("https://sync.example.com", token, device_id);
//! let outcome = client.sync(&session, |_| {}).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod migration;
pub mod pull;
pub mod push;
pub mod scanner;
pub mod session;
pub mod store;
pub mod transport;

pub use cancel::CancelFlag;
pub use client::SyncClient;
pub use config::SyncConfig;
pub use error::{ClientError, StoreError, TransportError};
pub use pull::{PullOutcome, TableOutcome};
pub use push::PushSummary;
pub use scanner::{ScanResult, SyncedTable};
pub use session::Session;
pub use store::{LocalStore, SqliteStore};
pub use transport::{
    HttpConfig, HttpEndpoints, HttpTransport, MockTransport, SyncTransport,
};
