use chrono::{DateTime, Utc};
use sqlmigrate_common::{AppliedRecord, Error, Result, TableName};
use tracing::debug;

use crate::backend::{Database, Dialect, Transaction};

/// Reads and writes the table recording which migrations have run.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    table: TableName,
    dialect: Dialect,
}

impl LedgerStore {
    pub fn new(table: TableName, dialect: Dialect) -> Self {
        Self { table, dialect }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Create the ledger table if it is missing. Safe to call on every run.
    pub fn ensure_table<D: Database>(&self, db: &mut D) -> Result<()> {
        debug!("ensuring migration ledger table {}", self.table);
        db.execute(&self.create_table_sql())
            .map_err(|e| Error::store(format!("create ledger table {}", self.table), e))
    }

    /// Every recorded migration, in whatever order the database returns them.
    pub fn list_applied<D: Database>(&self, db: &mut D) -> Result<Vec<AppliedRecord>> {
        db.query_records(&self.select_sql())
            .map_err(|e| Error::store(format!("read ledger table {}", self.table), e))
    }

    /// Insert a ledger row inside `tx`. The caller owns the commit.
    pub fn record_applied<T: Transaction>(
        &self,
        tx: &mut T,
        id: &str,
        applied_at: DateTime<Utc>,
    ) -> Result<()> {
        tx.insert_record(&self.insert_sql(), id, applied_at)
            .map_err(|e| Error::store(format!("record migration {id} in {}", self.table), e))
    }

    pub fn create_table_sql(&self) -> String {
        let table = self.dialect.quote_ident(self.table.as_str());
        let id = self.dialect.quote_ident("id");
        let applied_at = self.dialect.quote_ident("applied_at");
        match self.dialect {
            Dialect::Sqlite => format!(
                "CREATE TABLE IF NOT EXISTS {table} ({id} TEXT NOT NULL PRIMARY KEY, {applied_at} TEXT DEFAULT NULL)"
            ),
            Dialect::MySql => format!(
                "CREATE TABLE IF NOT EXISTS {table} ({id} varchar(255) NOT NULL, {applied_at} datetime DEFAULT NULL, PRIMARY KEY ({id})) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
            ),
        }
    }

    pub fn select_sql(&self) -> String {
        format!(
            "SELECT {}, {} FROM {}",
            self.dialect.quote_ident("id"),
            self.dialect.quote_ident("applied_at"),
            self.dialect.quote_ident(self.table.as_str()),
        )
    }

    pub fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}, {}) VALUES (?, ?)",
            self.dialect.quote_ident(self.table.as_str()),
            self.dialect.quote_ident("id"),
            self.dialect.quote_ident("applied_at"),
        )
    }
}
