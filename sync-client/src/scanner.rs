//! Local change scanning.
//!
//! Reads the change-capture state the triggers maintain and builds the
//! outbound packet. Nothing is modified here: the statements that clear
//! markers and audit rows are staged and only run once the server has
//! accepted the packet.
//!
//! A synchronized table is one whose schema mentions `rowid` (the server
//! row identifier column). Rows with a null `rowid` were never pushed;
//! rows with a positive `mergeupdate` changed since the last push.

use crate::error::StoreError;
use crate::store::LocalStore;
use ampli_sync_core::schema_columns;
use ampli_sync_types::{ChangePacket, DeleteRecord, PushRequest, Row, SqlValue, Statement};
use serde_json::Value;

/// Audit table recording local deletions.
pub const DELETE_AUDIT_TABLE: &str = "mergedelete";

/// Dirty-marker column present on every synchronized table.
pub const MARKER_COLUMN: &str = "mergeupdate";

/// A table taking part in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedTable {
    /// Table name
    pub name: String,
    /// `CREATE TABLE` text from the catalog
    pub sql: String,
}

/// Result of a scan: the packet plus its staged cleanup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    /// What to send
    pub request: PushRequest,
    /// Marker resets, one per pending update
    pub clear_markers: Vec<Statement>,
    /// Audit row removals, one per queued deletion
    pub clear_deletes: Vec<Statement>,
}

impl ScanResult {
    /// True when nothing is pending locally.
    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.clear_markers.is_empty() && self.clear_deletes.is_empty()
    }

    /// All staged cleanup statements, markers first.
    pub fn cleanup(&self) -> Vec<Statement> {
        self.clear_markers
            .iter()
            .chain(&self.clear_deletes)
            .cloned()
            .collect()
    }
}

/// List synchronized tables in catalog order, the delete audit table excluded.
pub async fn synced_tables<S>(store: &S) -> Result<Vec<SyncedTable>, StoreError>
where
    S: LocalStore + ?Sized,
{
    let rows = store
        .query_all(
            "SELECT tbl_name, sql FROM sqlite_master WHERE type='table' AND sql LIKE '%rowid%'",
            &[],
        )
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = row.get("tbl_name")?.as_str()?;
            if name.is_empty() || name == DELETE_AUDIT_TABLE {
                return None;
            }
            Some(SyncedTable {
                name: name.to_string(),
                sql: row.get("sql").and_then(Value::as_str).unwrap_or_default().to_string(),
            })
        })
        .collect())
}

/// Scan every synchronized table and the delete audit table.
pub async fn scan<S>(store: &S) -> Result<ScanResult, StoreError>
where
    S: LocalStore + ?Sized,
{
    let mut result = ScanResult::default();

    for table in synced_tables(store).await? {
        let columns = schema_columns(&table.sql);
        if columns.is_empty() {
            continue;
        }

        let inserts = store
            .query_all(&format!("SELECT * FROM {} WHERE rowid IS NULL", table.name), &[])
            .await?;
        let updates = store
            .query_all(
                &format!(
                    "SELECT * FROM {} WHERE {} > 0 AND rowid IS NOT NULL",
                    table.name, MARKER_COLUMN
                ),
                &[],
            )
            .await?;

        let mut packet = ChangePacket::new(table.name.as_str());
        packet.inserts = inserts.iter().map(|row| outbound_row(row, &columns)).collect();
        for row in &updates {
            result.clear_markers.push(Statement::with_args(
                format!(
                    "UPDATE {} SET {marker}=0 WHERE rowid=? AND {marker}=?",
                    table.name,
                    marker = MARKER_COLUMN
                ),
                vec![
                    rowid_text(row.get("rowid")),
                    row.get(MARKER_COLUMN)
                        .map(SqlValue::from_json)
                        .unwrap_or(SqlValue::Null),
                ],
            ));
            packet.updates.push(outbound_row(row, &columns));
        }

        if !packet.is_empty() {
            result.request.changes.push(packet);
        }
    }

    scan_deletes(store, &mut result).await?;
    Ok(result)
}

async fn scan_deletes<S>(store: &S, result: &mut ScanResult) -> Result<(), StoreError>
where
    S: LocalStore + ?Sized,
{
    let audit = store
        .query_all(
            "SELECT name FROM sqlite_master WHERE type='table' AND name=?",
            &[SqlValue::from(DELETE_AUDIT_TABLE)],
        )
        .await?;
    if audit.is_empty() {
        return Ok(());
    }

    let rows = store
        .query_all(
            &format!("SELECT tableid, rowid FROM {}", DELETE_AUDIT_TABLE),
            &[],
        )
        .await?;

    for row in rows {
        let table = rowid_text(row.get("tableid"));
        let rowid = rowid_text(row.get("rowid"));

        match (table, rowid) {
            (SqlValue::Text(table), SqlValue::Text(rowid)) => {
                result.clear_deletes.push(Statement::with_args(
                    format!(
                        "DELETE FROM {} WHERE tableid=? AND rowid=?",
                        DELETE_AUDIT_TABLE
                    ),
                    vec![SqlValue::Text(table.clone()), SqlValue::Text(rowid.clone())],
                ));
                result.request.deletes.push(DeleteRecord { table, rowid });
            }
            // Missing table or never-pushed row: nothing the server can act on
            (table, rowid) => result.clear_deletes.push(Statement::with_args(
                format!(
                    "DELETE FROM {} WHERE tableid IS ? AND rowid IS ?",
                    DELETE_AUDIT_TABLE
                ),
                vec![table, rowid],
            )),
        }
    }

    Ok(())
}

/// The row as sent: schema columns in declared order, marker excluded.
fn outbound_row(source: &Row, columns: &[String]) -> Row {
    columns
        .iter()
        .filter(|column| column.as_str() != MARKER_COLUMN)
        .map(|column| {
            (
                column.clone(),
                // NULL columns go out as JSON null, not the string 'null'
                source.get(column).cloned().unwrap_or(Value::Null),
            )
        })
        .collect()
}

/// Server row identifiers are compared as text.
fn rowid_text(value: Option<&Value>) -> SqlValue {
    match value {
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(Value::Null) | None => SqlValue::Null,
        Some(other) => SqlValue::Text(other.to_string()),
    }
}
