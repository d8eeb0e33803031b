//! Change-set materialization.
//!
//! Turns one pull page into the ordered statements that apply it locally:
//!
//! ```text
//! suspend audit  →  inserts  →  updates  →  deletes  →  resume audit
//! ```
//!
//! Audit suspension is a strategy ([`AuditSuppression`]). The default,
//! [`TriggerToggles`], drops the change-capture triggers with the
//! statements supplied by the server and re-creates them afterwards, so
//! server-authoritative writes never mark rows dirty or queue deletions.

use ampli_sync_types::{PageRecords, Row, SqlValue, Statement, SyncPage};
use serde_json::Value;
use thiserror::Error;

use crate::template::{insert_columns, update_columns};

/// Table whose writes must stay trigger-audited, even when applied from a pull.
pub const PROTECTED_TABLE: &str = "mergeidentity";

/// Errors raised while materializing a page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChangeSetError {
    /// A delete entry has no usable `rowid`
    #[error("invalid delete record for table '{table}': {reason}")]
    InvalidDeleteRecord {
        /// Table the page belongs to
        table: String,
        /// What was wrong with the entry
        reason: &'static str,
    },

    /// The page has entries but lacks the statement needed to apply them
    #[error("missing {template} for table '{table}'")]
    MissingTemplate {
        /// Table the page belongs to
        table: String,
        /// Name of the absent page field
        template: &'static str,
    },
}

/// How change capture is paused around a bulk apply.
pub trait AuditSuppression {
    /// Statements run before the page's writes.
    fn suspend(&self, table: &str) -> Result<Vec<Statement>, ChangeSetError>;

    /// Statements run after the page's writes.
    fn resume(&self, table: &str) -> Result<Vec<Statement>, ChangeSetError>;
}

/// Suppression for backends without change-capture triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuppression;

impl AuditSuppression for NoSuppression {
    fn suspend(&self, _table: &str) -> Result<Vec<Statement>, ChangeSetError> {
        Ok(Vec::new())
    }

    fn resume(&self, _table: &str) -> Result<Vec<Statement>, ChangeSetError> {
        Ok(Vec::new())
    }
}

/// Drop/re-create statements for the three change-capture triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerToggles {
    /// `TriggerInsertDrop`
    pub drop_insert: Option<String>,
    /// `TriggerUpdateDrop`
    pub drop_update: Option<String>,
    /// `TriggerDeleteDrop`
    pub drop_delete: Option<String>,
    /// `TriggerInsert`
    pub create_insert: Option<String>,
    /// `TriggerUpdate`
    pub create_update: Option<String>,
    /// `TriggerDelete`
    pub create_delete: Option<String>,
    exempt_tables: Vec<String>,
}

impl TriggerToggles {
    /// Take the six trigger statements from a page.
    ///
    /// [`PROTECTED_TABLE`] is exempt by default.
    pub fn from_page(page: &SyncPage) -> Self {
        Self {
            drop_insert: page.trigger_insert_drop.clone(),
            drop_update: page.trigger_update_drop.clone(),
            drop_delete: page.trigger_delete_drop.clone(),
            create_insert: page.trigger_insert.clone(),
            create_update: page.trigger_update.clone(),
            create_delete: page.trigger_delete.clone(),
            exempt_tables: vec![PROTECTED_TABLE.to_string()],
        }
    }

    /// Replace the set of tables whose triggers are never toggled.
    pub fn with_exempt_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the table keeps its triggers during apply.
    pub fn is_exempt(&self, table: &str) -> bool {
        self.exempt_tables.iter().any(|t| t == table)
    }

    fn collect(
        &self,
        table: &str,
        statements: [(&Option<String>, &'static str); 3],
    ) -> Result<Vec<Statement>, ChangeSetError> {
        if self.is_exempt(table) {
            return Ok(Vec::new());
        }
        statements
            .into_iter()
            .map(|(sql, template)| {
                sql.as_deref()
                    .map(Statement::new)
                    .ok_or_else(|| ChangeSetError::MissingTemplate {
                        table: table.to_string(),
                        template,
                    })
            })
            .collect()
    }
}

impl AuditSuppression for TriggerToggles {
    fn suspend(&self, table: &str) -> Result<Vec<Statement>, ChangeSetError> {
        self.collect(
            table,
            [
                (&self.drop_insert, "TriggerInsertDrop"),
                (&self.drop_update, "TriggerUpdateDrop"),
                (&self.drop_delete, "TriggerDeleteDrop"),
            ],
        )
    }

    fn resume(&self, table: &str) -> Result<Vec<Statement>, ChangeSetError> {
        self.collect(
            table,
            [
                (&self.create_insert, "TriggerInsert"),
                (&self.create_update, "TriggerUpdate"),
                (&self.create_delete, "TriggerDelete"),
            ],
        )
    }
}

/// The three write templates of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTemplates {
    /// `QueryInsert`
    pub insert: Option<String>,
    /// `QueryUpdate`
    pub update: Option<String>,
    /// `QueryDelete`
    pub delete: Option<String>,
}

impl QueryTemplates {
    /// Take the write templates from a page.
    pub fn from_page(page: &SyncPage) -> Self {
        Self {
            insert: page.query_insert.clone(),
            update: page.query_update.clone(),
            delete: page.query_delete.clone(),
        }
    }
}

/// Statements applying one page, bracketed by audit suspension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Run first
    pub suspend: Vec<Statement>,
    /// Inserts, then updates, then deletes
    pub writes: Vec<Statement>,
    /// Run last
    pub resume: Vec<Statement>,
}

impl ChangeSet {
    /// True when the page produced no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Total number of statements, brackets included.
    pub fn len(&self) -> usize {
        self.suspend.len() + self.writes.len() + self.resume.len()
    }

    /// Flatten into execution order.
    pub fn into_statements(self) -> Vec<Statement> {
        let mut statements = self.suspend;
        statements.extend(self.writes);
        statements.extend(self.resume);
        statements
    }
}

/// Build the change set for one page of a table.
///
/// A page without entries yields an empty change set (no trigger toggling).
pub fn materialize(
    table: &str,
    records: &PageRecords,
    templates: &QueryTemplates,
    audit: &dyn AuditSuppression,
) -> Result<ChangeSet, ChangeSetError> {
    if records.is_empty() {
        return Ok(ChangeSet::default());
    }

    let mut writes = Vec::with_capacity(records.len());

    if !records.inserts.is_empty() {
        let sql = required(table, &templates.insert, "QueryInsert")?;
        let columns = insert_columns(sql);
        for row in &records.inserts {
            writes.push(Statement::with_args(sql, row_args(row, &columns)));
        }
    }

    if !records.updates.is_empty() {
        let sql = required(table, &templates.update, "QueryUpdate")?;
        let columns = update_columns(sql);
        for row in &records.updates {
            let mut args = row_args(row, &columns.set_columns);
            if let Some(key) = &columns.where_column {
                args.push(column_value(row, key));
            }
            writes.push(Statement::with_args(sql, args));
        }
    }

    if !records.deletes.is_empty() {
        let template = required(table, &templates.delete, "QueryDelete")?;
        let sql = if template.contains('?') {
            template.to_string()
        } else {
            format!("{}?", template.trim_end())
        };
        for entry in &records.deletes {
            let rowid = delete_rowid(table, entry)?;
            writes.push(Statement::with_args(sql.clone(), vec![SqlValue::Text(rowid)]));
        }
    }

    Ok(ChangeSet {
        suspend: audit.suspend(table)?,
        writes,
        resume: audit.resume(table)?,
    })
}

fn required<'a>(
    table: &str,
    template: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, ChangeSetError> {
    template
        .as_deref()
        .ok_or_else(|| ChangeSetError::MissingTemplate {
            table: table.to_string(),
            template: name,
        })
}

/// Values for the resolved columns; falls back to the row's own key order.
fn row_args(row: &Row, columns: &[String]) -> Vec<SqlValue> {
    if columns.is_empty() {
        return row.values().map(SqlValue::from_json).collect();
    }
    columns.iter().map(|c| column_value(row, c)).collect()
}

fn column_value(row: &Row, column: &str) -> SqlValue {
    row.get(column)
        .map(SqlValue::from_json)
        .unwrap_or(SqlValue::Null)
}

fn delete_rowid(table: &str, entry: &Value) -> Result<String, ChangeSetError> {
    let Some(object) = entry.as_object() else {
        return Err(ChangeSetError::InvalidDeleteRecord {
            table: table.to_string(),
            reason: "expected object with rowid",
        });
    };
    match object.get("rowid") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ChangeSetError::InvalidDeleteRecord {
            table: table.to_string(),
            reason: "expected { rowid: string | number }",
        }),
    }
}
