//! # sync-types
//!
//! Wire format types for the ampli-sync table synchronization protocol.
//!
//! This crate provides the foundational types used across all ampli-sync crates:
//! - [`SyncId`] - Server-assigned page identifier
//! - [`Row`], [`SqlValue`], [`Statement`] - Open row shape and local statements
//! - [`SyncPage`], [`PushRequest`], [`MigrationRecord`] - Protocol payloads
//! - [`PayloadError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod value;

pub use error::PayloadError;
pub use ids::SyncId;
pub use messages::{
    ChangePacket, DeleteRecord, MigrationRecord, MigrationReport, PageRecords, PushRequest,
    SyncPage,
};
pub use value::{Row, SqlValue, Statement};
