pub mod backend;
pub mod catalog;
pub mod diff;
pub mod ledger;
pub mod migrator;
pub mod sqlite;

pub use backend::{Database, Dialect, Transaction};
pub use catalog::{DirectorySource, MemorySource, MigrationSource};
pub use diff::pending_migrations;
pub use ledger::LedgerStore;
pub use migrator::{ApplyFailure, MigrationStatus, Migrator, apply};
pub use sqlite::SqliteDatabase;
