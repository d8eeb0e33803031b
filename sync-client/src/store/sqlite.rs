//! SQLite store backend.

use super::LocalStore;
use crate::error::StoreError;
use ampli_sync_types::{Row, SqlValue, Statement};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow, SqliteSynchronous,
};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use std::path::Path;
use std::str::FromStr;

/// SQLite-backed local store.
///
/// File databases use WAL mode.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open a database file, creating it if missing.
    pub async fn new(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing).
    ///
    /// A single connection that is never recycled, so the data lives as
    /// long as the store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(":memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn query_all(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        let rows = bind_args(sqlx::query(sql), args)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<(), StoreError> {
        bind_args(sqlx::query(sql), args)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn execute_batch(&self, statements: &[Statement]) -> Result<(), StoreError> {
        if statements.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on error rolls it back
        let mut tx = self.pool.begin().await?;
        for statement in statements {
            bind_args(sqlx::query(&statement.sql), &statement.args)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn bind_args<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    args: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Real(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

/// Decode by the storage class of each value, not the declared column type.
fn decode_row(row: &SqliteRow) -> Result<Row, StoreError> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => serde_json::Number::from_f64(row.try_get_unchecked::<f64, _>(index)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store_with_table() -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .execute(
                "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL, rowid TEXT, mergeupdate INTEGER DEFAULT 0)",
                &[],
            )
            .await
            .unwrap();
        store
    }

    // ===========================================
    // Queries
    // ===========================================

    #[tokio::test]
    async fn query_decodes_storage_classes() {
        let store = store_with_table().await;
        store
            .execute(
                "INSERT INTO items (id, name, price, rowid) VALUES (?, ?, ?, ?)",
                &[
                    SqlValue::Integer(1),
                    SqlValue::Text("battery".into()),
                    SqlValue::Real(24.5),
                    SqlValue::Null,
                ],
            )
            .await
            .unwrap();

        let rows = store.query_all("SELECT * FROM items", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["id"], json!(1));
        assert_eq!(row["name"], json!("battery"));
        assert_eq!(row["price"], json!(24.5));
        assert_eq!(row["rowid"], Value::Null);
        assert_eq!(row["mergeupdate"], json!(0));
    }

    #[tokio::test]
    async fn query_keeps_select_column_order() {
        let store = store_with_table().await;
        store
            .execute("INSERT INTO items (id, name) VALUES (1, 'a')", &[])
            .await
            .unwrap();

        let rows = store
            .query_all("SELECT name, id FROM items WHERE id = ?", &[SqlValue::Integer(1)])
            .await
            .unwrap();
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["name", "id"]);
    }

    #[tokio::test]
    async fn query_error_surfaces() {
        let store = SqliteStore::in_memory().await.unwrap();
        let result = store.query_all("SELECT * FROM missing", &[]).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    // ===========================================
    // Batches
    // ===========================================

    #[tokio::test]
    async fn batch_applies_all_statements() {
        let store = store_with_table().await;
        store
            .execute_batch(&[
                Statement::with_args(
                    "INSERT INTO items (id, name) VALUES (?, ?)",
                    vec![SqlValue::Integer(1), "a".into()],
                ),
                Statement::with_args(
                    "INSERT INTO items (id, name) VALUES (?, ?)",
                    vec![SqlValue::Integer(2), "b".into()],
                ),
            ])
            .await
            .unwrap();

        let rows = store.query_all("SELECT id FROM items", &[]).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn failed_batch_applies_nothing() {
        let store = store_with_table().await;
        let result = store
            .execute_batch(&[
                Statement::new("INSERT INTO items (id, name) VALUES (1, 'a')"),
                Statement::new("INSERT INTO no_such_table VALUES (1)"),
            ])
            .await;
        assert!(result.is_err());

        let rows = store.query_all("SELECT id FROM items", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_noop() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.execute_batch(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.db");

        {
            let store = SqliteStore::new(&path).await.unwrap();
            store
                .execute("CREATE TABLE t (id INTEGER, rowid TEXT)", &[])
                .await
                .unwrap();
            store
                .execute("INSERT INTO t (id, rowid) VALUES (7, 'R7')", &[])
                .await
                .unwrap();
            store.pool().close().await;
        }

        let store = SqliteStore::new(&path).await.unwrap();
        let rows = store.query_all("SELECT rowid FROM t", &[]).await.unwrap();
        assert_eq!(rows[0]["rowid"], json!("R7"));
    }
}
