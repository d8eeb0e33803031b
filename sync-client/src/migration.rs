//! Migration applier.
//!
//! Runs server-issued statements in order, one at a time, and reports each
//! outcome back. Report delivery is best effort; an execution failure is
//! re-raised after its report and stops the remaining list.

use ampli_sync_core::{failure_report, is_pseudo_ddl, success_report};
use ampli_sync_types::{MigrationRecord, MigrationReport};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{ClientError, StoreError};
use crate::session::Session;
use crate::store::LocalStore;
use crate::transport::SyncTransport;

/// Apply migrations in array order; returns how many succeeded.
pub async fn apply_migrations<S, T>(
    store: &S,
    transport: &T,
    session: &Session,
    migrations: &[MigrationRecord],
) -> Result<usize, ClientError>
where
    S: LocalStore + ?Sized,
    T: SyncTransport + ?Sized,
{
    for (applied, migration) in migrations.iter().enumerate() {
        let started_at = Utc::now();
        let timer = Instant::now();

        let result = if is_pseudo_ddl(&migration.query) {
            Err(ClientError::UnsupportedMigration {
                id: migration.id.clone(),
                query: migration.query.clone(),
            })
        } else {
            store
                .execute(&migration.query, &[])
                .await
                .map_err(ClientError::from)
        };
        let elapsed_ms = u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(()) => {
                debug!(id = %migration.id, elapsed_ms, "migration applied");
                report(
                    transport,
                    session,
                    success_report(&migration.id, elapsed_ms, started_at),
                )
                .await;
            }
            Err(e) => {
                warn!(id = %migration.id, error = %e, "migration failed");
                report(
                    transport,
                    session,
                    failure_report(&migration.id, elapsed_ms, failure_message(&e)),
                )
                .await;
                info!(applied, remaining = migrations.len() - applied, "migrations aborted");
                return Err(e);
            }
        }
    }

    info!(count = migrations.len(), "migrations applied");
    Ok(migrations.len())
}

/// The engine's own message, without the client's error prefixes.
fn failure_message(err: &ClientError) -> String {
    match err {
        ClientError::Store(StoreError::Database(sqlx::Error::Database(db))) => {
            db.message().to_string()
        }
        ClientError::Store(StoreError::Database(e)) => e.to_string(),
        ClientError::Transport(e) => e.to_string(),
        ClientError::MalformedPayload(e) => e.to_string(),
        ClientError::ChangeSet(e) => e.to_string(),
        other => other.to_string(),
    }
}

async fn report<T>(transport: &T, session: &Session, report: MigrationReport)
where
    T: SyncTransport + ?Sized,
{
    if let Err(e) = transport.report_migration_result(session, &report).await {
        warn!(id = %report.id, error = %e, "failed to report migration result");
    }
}
