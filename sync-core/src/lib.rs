//! # sync-core
//!
//! Pure logic for ampli-sync (no I/O, instant tests).
//!
//! This crate implements the parsing, materialization and paging decisions
//! of the sync protocol without any network or database access.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (network, SQLite) is performed by `sync-client`, which
//! executes the statements and follows the transitions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod changeset;
pub mod migration;
pub mod paging;
pub mod progress;
pub mod template;

pub use changeset::{
    materialize, AuditSuppression, ChangeSet, ChangeSetError, NoSuppression, QueryTemplates,
    TriggerToggles, PROTECTED_TABLE,
};
pub use migration::{failure_report, is_pseudo_ddl, success_report, success_text};
pub use paging::{page_was_full, PageEvent, PullTally, TablePullState};
pub use progress::ProgressTracker;
pub use template::{insert_columns, schema_columns, update_columns, UpdateColumns};
