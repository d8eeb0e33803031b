//! Pull engine.
//!
//! Walks every synchronized table and drains it page by page:
//!
//! ```text
//! pull_page → validate → materialize → execute_batch (one transaction) → commit_sync
//! ```
//!
//! Paging decisions come from [`TablePullState`]. A table that fails stops
//! for this run without affecting the others; its unacknowledged page is
//! delivered again on the next run. The first error is kept and returned
//! once every table has been attempted.

use ampli_sync_core::{
    materialize, NoSuppression, PageEvent, ProgressTracker, PullTally, QueryTemplates,
    TablePullState, TriggerToggles,
};
use ampli_sync_types::{PageRecords, SyncPage};
use tracing::{debug, error, info};

use crate::cancel::CancelFlag;
use crate::config::SyncConfig;
use crate::error::ClientError;
use crate::scanner::synced_tables;
use crate::session::Session;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

/// How one table's loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutcome {
    /// Table name
    pub table: String,
    /// Final paging state
    pub state: TablePullState,
}

impl TableOutcome {
    /// Pages and records acknowledged for the table.
    pub fn tally(&self) -> PullTally {
        self.state.tally()
    }
}

/// Result of a pull run.
#[derive(Debug, Default)]
pub struct PullOutcome {
    /// Tables attempted, in order
    pub tables: Vec<TableOutcome>,
    /// First error encountered, if any
    pub first_error: Option<ClientError>,
}

impl PullOutcome {
    /// True when every table drained.
    pub fn is_ok(&self) -> bool {
        self.first_error.is_none()
    }

    /// Total records applied across tables.
    pub fn records_applied(&self) -> usize {
        self.tables.iter().map(|t| t.tally().records).sum()
    }

    /// Tables that ended in error.
    pub fn failed_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| t.state.is_errored())
            .map(|t| t.table.as_str())
            .collect()
    }

    /// Convert into a `Result`, surfacing the first error.
    pub fn into_result(self) -> Result<Vec<TableOutcome>, ClientError> {
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(self.tables),
        }
    }

    fn record_error(&mut self, err: ClientError) {
        if self.first_error.is_none() {
            self.first_error = Some(err);
        }
    }
}

/// Pull every synchronized table.
///
/// `on_progress` receives a fraction in `[0, 1]` after each table.
pub async fn pull_all<S, T, F>(
    store: &S,
    transport: &T,
    session: &Session,
    config: &SyncConfig,
    cancel: &CancelFlag,
    mut on_progress: F,
) -> PullOutcome
where
    S: LocalStore + ?Sized,
    T: SyncTransport + ?Sized,
    F: FnMut(f64),
{
    let mut outcome = PullOutcome::default();

    let tables = match synced_tables(store).await {
        Ok(tables) => tables,
        Err(e) => {
            error!(error = %e, "failed to list synchronized tables");
            outcome.record_error(e.into());
            return outcome;
        }
    };

    let mut progress = ProgressTracker::new(tables.len()).with_lead_in(config.progress_lead_in);

    for table in tables {
        if cancel.is_cancelled() {
            info!(table = %table.name, "pull cancelled");
            outcome.record_error(ClientError::Cancelled);
            break;
        }

        let (state, err) = pull_table(store, transport, session, config, cancel, &table.name).await;
        if let Some(e) = err {
            outcome.record_error(e);
        }
        outcome.tables.push(TableOutcome {
            table: table.name,
            state,
        });

        on_progress(progress.advance());
    }

    outcome
}

/// Drain one table; returns the final state and the error that ended it.
pub async fn pull_table<S, T>(
    store: &S,
    transport: &T,
    session: &Session,
    config: &SyncConfig,
    cancel: &CancelFlag,
    table: &str,
) -> (TablePullState, Option<ClientError>)
where
    S: LocalStore + ?Sized,
    T: SyncTransport + ?Sized,
{
    let mut state = TablePullState::new();

    while state.wants_page() {
        if cancel.is_cancelled() {
            info!(table, "pull cancelled between pages");
            return (state.on_event(PageEvent::Cancelled), Some(ClientError::Cancelled));
        }

        match pull_once(store, transport, session, config, table).await {
            Ok(event) => {
                if let PageEvent::Applied {
                    record_count,
                    max_package_size,
                } = event
                {
                    debug!(table, record_count, max_package_size, "page applied");
                }
                state = state.on_event(event);
            }
            Err(e) => {
                error!(table, error = %e, "pull failed for table");
                return (state.on_event(PageEvent::Failed), Some(e));
            }
        }
    }

    let tally = state.tally();
    info!(table, pages = tally.pages, records = tally.records, "table drained");
    (state, None)
}

/// Fetch, apply and acknowledge one page.
async fn pull_once<S, T>(
    store: &S,
    transport: &T,
    session: &Session,
    config: &SyncConfig,
    table: &str,
) -> Result<PageEvent, ClientError>
where
    S: LocalStore + ?Sized,
    T: SyncTransport + ?Sized,
{
    let page = transport.pull_page(session, table).await?;
    if !page.has_changes() {
        return Ok(PageEvent::NoChanges);
    }

    let records = page.records(table)?;
    apply_page(store, config, table, &page, &records).await?;

    // Only acknowledged pages count as consumed
    transport.commit_sync(session, page.sync_id).await?;

    Ok(PageEvent::Applied {
        record_count: records.len(),
        max_package_size: page.max_package_size,
    })
}

async fn apply_page<S>(
    store: &S,
    config: &SyncConfig,
    table: &str,
    page: &SyncPage,
    records: &PageRecords,
) -> Result<(), ClientError>
where
    S: LocalStore + ?Sized,
{
    let templates = QueryTemplates::from_page(page);
    let change_set = if config.toggle_triggers {
        let toggles = TriggerToggles::from_page(page)
            .with_exempt_tables(config.audit_exempt_tables.iter().cloned());
        materialize(table, records, &templates, &toggles)?
    } else {
        materialize(table, records, &templates, &NoSuppression)?
    };

    if change_set.is_empty() {
        return Ok(());
    }

    store.execute_batch(&change_set.into_statements()).await?;
    Ok(())
}
