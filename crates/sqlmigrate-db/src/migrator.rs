//! The apply engine.
//!
//! Every pending migration runs in its own transaction together with its
//! ledger row. A failure leaves earlier migrations committed and the next run
//! resumes at the migration that failed.

use chrono::Utc;
use sqlmigrate_common::{AppliedRecord, Direction, Error, Migration, Result, TableName};
use tracing::{debug, info, warn};

use crate::backend::{Database, Transaction};
use crate::catalog::MigrationSource;
use crate::diff::pending_migrations;
use crate::ledger::LedgerStore;

/// A run that stopped early. `applied` migrations were durably committed
/// before `error` occurred.
#[derive(thiserror::Error, Debug)]
#[error("migration run stopped after {applied} applied migration(s): {error}")]
pub struct ApplyFailure {
    pub applied: usize,
    pub error: Error,
}

impl ApplyFailure {
    fn before_any(error: Error) -> Self {
        Self { applied: 0, error }
    }
}

/// Snapshot of the ledger against a catalog.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub applied: Vec<AppliedRecord>,
    pub pending: Vec<Migration>,
}

#[derive(Debug, Clone, Default)]
pub struct Migrator {
    table: TableName,
}

impl Migrator {
    pub fn new(table: TableName) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Apply every pending migration from `source`, returning how many ran.
    ///
    /// Only [`Direction::Up`] is supported; anything else fails before the
    /// database is touched.
    pub fn apply<D, S>(
        &self,
        db: &mut D,
        source: &S,
        direction: Direction,
    ) -> std::result::Result<usize, ApplyFailure>
    where
        D: Database,
        S: MigrationSource + ?Sized,
    {
        if direction != Direction::Up {
            return Err(ApplyFailure::before_any(Error::UnsupportedDirection(
                direction,
            )));
        }

        let ledger = LedgerStore::new(self.table.clone(), db.dialect());
        let pending = self
            .load_pending(db, source, &ledger)
            .map_err(ApplyFailure::before_any)?;

        if pending.is_empty() {
            info!("no pending migrations");
            return Ok(0);
        }
        info!("applying {} pending migration(s)", pending.len());

        let mut applied = 0;
        for migration in &pending {
            if let Err(error) = apply_one(db, &ledger, migration) {
                warn!("migration {} failed: {error}", migration.id);
                return Err(ApplyFailure { applied, error });
            }
            applied += 1;
            info!("applied migration {}", migration.id);
        }

        Ok(applied)
    }

    /// Applied ledger rows and the migrations still waiting to run.
    pub fn status<D, S>(&self, db: &mut D, source: &S) -> Result<MigrationStatus>
    where
        D: Database,
        S: MigrationSource + ?Sized,
    {
        let ledger = LedgerStore::new(self.table.clone(), db.dialect());
        ledger.ensure_table(db)?;
        let catalog = find_migrations(source)?;
        let applied = ledger.list_applied(db)?;
        let pending = pending_migrations(&catalog, &applied);
        Ok(MigrationStatus { applied, pending })
    }

    fn load_pending<D, S>(
        &self,
        db: &mut D,
        source: &S,
        ledger: &LedgerStore,
    ) -> Result<Vec<Migration>>
    where
        D: Database,
        S: MigrationSource + ?Sized,
    {
        ledger.ensure_table(db)?;
        let catalog = find_migrations(source)?;
        let applied = ledger.list_applied(db)?;
        debug!(
            "catalog has {} migration(s), ledger has {} record(s)",
            catalog.len(),
            applied.len()
        );
        Ok(pending_migrations(&catalog, &applied))
    }
}

/// Apply pending migrations using the default ledger table.
pub fn apply<D, S>(
    db: &mut D,
    source: &S,
    direction: Direction,
) -> std::result::Result<usize, ApplyFailure>
where
    D: Database,
    S: MigrationSource + ?Sized,
{
    Migrator::default().apply(db, source, direction)
}

fn find_migrations<S: MigrationSource + ?Sized>(source: &S) -> Result<Vec<Migration>> {
    source.find_migrations().map_err(|e| match e {
        Error::Catalog(_) => e,
        other => Error::Catalog(other.to_string()),
    })
}

fn apply_one<D: Database>(db: &mut D, ledger: &LedgerStore, migration: &Migration) -> Result<()> {
    let mut tx = db.begin().map_err(|source| Error::Begin {
        id: migration.id.clone(),
        source,
    })?;

    for statement in &migration.up {
        debug!("migration {}: executing {statement}", migration.id);
        if let Err(source) = tx.execute(statement) {
            rollback(tx, &migration.id);
            return Err(Error::MigrationApply {
                id: migration.id.clone(),
                statement: statement.clone(),
                source,
            });
        }
    }

    if let Err(e) = ledger.record_applied(&mut tx, &migration.id, Utc::now()) {
        rollback(tx, &migration.id);
        return Err(e);
    }

    tx.commit().map_err(|source| Error::Commit {
        id: migration.id.clone(),
        source,
    })
}

fn rollback<T: Transaction>(tx: T, id: &str) {
    if let Err(e) = tx.rollback() {
        warn!("rollback of migration {id} failed: {e}");
    }
}
