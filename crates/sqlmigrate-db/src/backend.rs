use chrono::{DateTime, Utc};
use sqlmigrate_common::{AppliedRecord, BoxError};

/// SQL flavour a backend speaks. Decides identifier quoting and the ledger DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Self::Sqlite => format!("\"{ident}\""),
            Self::MySql => format!("`{ident}`"),
        }
    }
}

/// A connection the migrator can run ledger queries and transactions on.
///
/// Errors are returned untouched; the caller decides how to classify them.
pub trait Database {
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    fn dialect(&self) -> Dialect;

    /// Run a statement outside any explicit transaction.
    fn execute(&mut self, sql: &str) -> Result<(), BoxError>;

    /// Run a `SELECT id, applied_at ...` query and decode each row.
    fn query_records(&mut self, sql: &str) -> Result<Vec<AppliedRecord>, BoxError>;

    fn begin(&mut self) -> Result<Self::Transaction<'_>, BoxError>;
}

/// An open transaction. Dropping it without `commit` must roll it back.
pub trait Transaction {
    fn execute(&mut self, sql: &str) -> Result<(), BoxError>;

    /// Run an insert with the migration id and timestamp bound as parameters.
    fn insert_record(
        &mut self,
        sql: &str,
        id: &str,
        applied_at: DateTime<Utc>,
    ) -> Result<(), BoxError>;

    fn commit(self) -> Result<(), BoxError>;

    fn rollback(self) -> Result<(), BoxError>;
}
