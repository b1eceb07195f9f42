use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use sqlmigrate_common::{AppliedRecord, BoxError, Error, Result};
use tracing::info;

use crate::backend::{Database, Dialect, Transaction};

/// [`Database`] backed by a single rusqlite connection.
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening migration database at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::store("open database", e))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::store("set pragmas", e))?;

        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store("open in-memory database", e))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::store("set pragmas", e))?;

        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl Database for SqliteDatabase {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str) -> std::result::Result<(), BoxError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query_records(&mut self, sql: &str) -> std::result::Result<Vec<AppliedRecord>, BoxError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(AppliedRecord {
                id: row.get(0)?,
                applied_at: row.get::<_, Option<DateTime<Utc>>>(1)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn begin(&mut self) -> std::result::Result<SqliteTransaction<'_>, BoxError> {
        let tx = self.conn.transaction()?;
        Ok(SqliteTransaction { tx })
    }
}

/// Wraps [`rusqlite::Transaction`], which rolls back when dropped.
pub struct SqliteTransaction<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

impl Transaction for SqliteTransaction<'_> {
    fn execute(&mut self, sql: &str) -> std::result::Result<(), BoxError> {
        self.tx.execute_batch(sql)?;
        Ok(())
    }

    fn insert_record(
        &mut self,
        sql: &str,
        id: &str,
        applied_at: DateTime<Utc>,
    ) -> std::result::Result<(), BoxError> {
        self.tx.execute(sql, params![id, applied_at])?;
        Ok(())
    }

    fn commit(self) -> std::result::Result<(), BoxError> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> std::result::Result<(), BoxError> {
        self.tx.rollback()?;
        Ok(())
    }
}
