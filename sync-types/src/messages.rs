//! Protocol payloads for ampli-sync.
//!
//! Field names follow the server's JSON: push requests and migration
//! records are lower/camel case, pull pages are PascalCase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{PayloadError, Row, SyncId};

/// Local changes of one table, sent on push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePacket {
    /// Table name
    pub table: String,
    /// Rows never assigned a server `rowid`
    pub inserts: Vec<Row>,
    /// Rows flagged dirty by `mergeupdate`
    pub updates: Vec<Row>,
}

impl ChangePacket {
    /// An empty packet for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            inserts: Vec::new(),
            updates: Vec::new(),
        }
    }

    /// True when there is nothing to send for the table.
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }
}

/// A row deleted locally and queued for the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRecord {
    /// Table the row belonged to
    pub table: String,
    /// Server row identifier
    pub rowid: String,
}

/// The outbound packet of one push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    /// Per-table inserts and updates
    pub changes: Vec<ChangePacket>,
    /// Queued deletions across all tables
    pub deletes: Vec<DeleteRecord>,
}

impl PushRequest {
    /// True when no table has pending work.
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(ChangePacket::is_empty) && self.deletes.is_empty()
    }

    /// Total pending inserts across tables.
    pub fn insert_count(&self) -> usize {
        self.changes.iter().map(|c| c.inserts.len()).sum()
    }

    /// Total pending updates across tables.
    pub fn update_count(&self) -> usize {
        self.changes.iter().map(|c| c.updates.len()).sum()
    }
}

/// The `Records` object of a pull page.
///
/// Delete entries stay as raw JSON: they are validated one by one when the
/// page is materialized, so a bad entry can be reported with its table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecords {
    /// Rows to insert
    #[serde(default)]
    pub inserts: Vec<Row>,
    /// Rows to update
    #[serde(default)]
    pub updates: Vec<Row>,
    /// Delete entries, expected `{ "rowid": string | number }`
    #[serde(default)]
    pub deletes: Vec<Value>,
}

impl PageRecords {
    /// Number of change entries in the page.
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }

    /// True when the page carries no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One page of server changes for a single table.
///
/// Decoding never fails on field types: `SyncId` and `MaxPackageSize`
/// accept numbers or numeric strings, and a template that is not a string
/// is dropped and listed in `malformed_fields`, so [`SyncPage::records`]
/// can reject the page with its table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "RawSyncPage")]
pub struct SyncPage {
    /// Page identifier; `<= 0` means nothing to apply
    pub sync_id: SyncId,
    /// Server page size limit
    pub max_package_size: i64,
    /// Change entries (validated with [`SyncPage::records`])
    pub records: Option<Value>,
    /// Parameterized INSERT template
    pub query_insert: Option<String>,
    /// Parameterized UPDATE template
    pub query_update: Option<String>,
    /// DELETE template keyed by rowid
    pub query_delete: Option<String>,
    /// Re-creates the insert trigger
    pub trigger_insert: Option<String>,
    /// Re-creates the update trigger
    pub trigger_update: Option<String>,
    /// Re-creates the delete trigger
    pub trigger_delete: Option<String>,
    /// Drops the insert trigger
    pub trigger_insert_drop: Option<String>,
    /// Drops the update trigger
    pub trigger_update_drop: Option<String>,
    /// Drops the delete trigger
    pub trigger_delete_drop: Option<String>,
    /// Template fields that arrived with a non-string value
    #[serde(skip)]
    pub malformed_fields: Vec<&'static str>,
}

impl SyncPage {
    /// A page telling the client the table has nothing new.
    pub fn no_changes() -> Self {
        Self::default()
    }

    /// Whether this page must be applied and acknowledged.
    pub fn has_changes(&self) -> bool {
        self.sync_id.has_changes()
    }

    /// Decode and validate the `Records` object and the page's templates.
    pub fn records(&self, table: &str) -> Result<PageRecords, PayloadError> {
        if let Some(field) = self.malformed_fields.first() {
            return Err(PayloadError::InvalidTemplate {
                table: table.to_string(),
                field,
            });
        }

        let value = self
            .records
            .as_ref()
            .ok_or_else(|| PayloadError::MissingRecords {
                table: table.to_string(),
            })?;

        if !value.is_object() {
            return Err(PayloadError::RecordsNotObject {
                table: table.to_string(),
            });
        }

        PageRecords::deserialize(value).map_err(|source| PayloadError::InvalidRecords {
            table: table.to_string(),
            source,
        })
    }
}

/// Wire form of [`SyncPage`] with every field left untyped.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSyncPage {
    #[serde(default)]
    sync_id: Value,
    #[serde(default)]
    max_package_size: Value,
    #[serde(default)]
    records: Option<Value>,
    #[serde(default)]
    query_insert: Value,
    #[serde(default)]
    query_update: Value,
    #[serde(default)]
    query_delete: Value,
    #[serde(default)]
    trigger_insert: Value,
    #[serde(default)]
    trigger_update: Value,
    #[serde(default)]
    trigger_delete: Value,
    #[serde(default)]
    trigger_insert_drop: Value,
    #[serde(default)]
    trigger_update_drop: Value,
    #[serde(default)]
    trigger_delete_drop: Value,
}

impl From<RawSyncPage> for SyncPage {
    fn from(raw: RawSyncPage) -> Self {
        let mut malformed = Vec::new();
        let mut text = |value: Value, field: &'static str| match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            _ => {
                malformed.push(field);
                None
            }
        };

        let query_insert = text(raw.query_insert, "QueryInsert");
        let query_update = text(raw.query_update, "QueryUpdate");
        let query_delete = text(raw.query_delete, "QueryDelete");
        let trigger_insert = text(raw.trigger_insert, "TriggerInsert");
        let trigger_update = text(raw.trigger_update, "TriggerUpdate");
        let trigger_delete = text(raw.trigger_delete, "TriggerDelete");
        let trigger_insert_drop = text(raw.trigger_insert_drop, "TriggerInsertDrop");
        let trigger_update_drop = text(raw.trigger_update_drop, "TriggerUpdateDrop");
        let trigger_delete_drop = text(raw.trigger_delete_drop, "TriggerDeleteDrop");

        Self {
            sync_id: SyncId::new(lenient_i64(&raw.sync_id)),
            max_package_size: lenient_i64(&raw.max_package_size),
            records: raw.records,
            query_insert,
            query_update,
            query_delete,
            trigger_insert,
            trigger_update,
            trigger_delete,
            trigger_insert_drop,
            trigger_update_drop,
            trigger_delete_drop,
            malformed_fields: malformed,
        }
    }
}

/// Accept a number or a numeric string; anything else reads as 0.
fn lenient_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// A server-issued migration statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Server identifier, echoed back in the report
    pub id: String,
    /// Literal SQL to execute
    pub query: String,
}

/// Outcome of one migration statement, reported to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Migration identifier
    pub id: String,
    /// Wall time spent executing, in milliseconds
    #[serde(rename = "executionTime")]
    pub execution_time_ms: u64,
    /// `ok <date> <time> ''` or the error message
    pub result: String,
}
