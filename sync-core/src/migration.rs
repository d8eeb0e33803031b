//! Migration guard and result formatting.
//!
//! The server must send complete SQL. The legacy `initialize table ...`
//! shorthand is recognized here so the client can refuse it before anything
//! reaches the store.

use ampli_sync_types::MigrationReport;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static PSEUDO_DDL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*initialize\s+table\b").unwrap());

/// Whether a migration uses the unsupported `initialize table` shorthand.
pub fn is_pseudo_ddl(query: &str) -> bool {
    PSEUDO_DDL_RE.is_match(query)
}

/// Result text for a successful statement: `ok <date> <time> ''` in UTC.
pub fn success_text(started_at: DateTime<Utc>) -> String {
    format!("ok {} ''", started_at.format("%Y-%m-%d %H:%M:%S"))
}

/// Report for a statement that executed.
pub fn success_report(
    id: impl Into<String>,
    execution_time_ms: u64,
    started_at: DateTime<Utc>,
) -> MigrationReport {
    MigrationReport {
        id: id.into(),
        execution_time_ms,
        result: success_text(started_at),
    }
}

/// Report for a statement that failed; the result is the error message.
pub fn failure_report(
    id: impl Into<String>,
    execution_time_ms: u64,
    message: impl Into<String>,
) -> MigrationReport {
    MigrationReport {
        id: id.into(),
        execution_time_ms,
        result: message.into(),
    }
}
