//! Local store abstraction.
//!
//! The engine only needs three operations from the device database: run a
//! query, run a statement, and run a list of statements atomically. Rows
//! come back as open JSON maps so the engine never depends on a schema.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use ampli_sync_types::{Row, SqlValue, Statement};
use async_trait::async_trait;

/// Trait for local store backends.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Run a query and return every row, columns in select order.
    async fn query_all(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>, StoreError>;

    /// Run one statement.
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<(), StoreError>;

    /// Run all statements in one transaction: either all apply or none do.
    async fn execute_batch(&self, statements: &[Statement]) -> Result<(), StoreError>;
}
