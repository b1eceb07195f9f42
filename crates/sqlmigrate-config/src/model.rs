use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sqlmigrate_common::{DEFAULT_TABLE_NAME, Result, TableName};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub migrations: MigrationsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sqlmigrate.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory holding `<id>.up.sql` / `<id>.down.sql` scripts.
    pub directory: PathBuf,
    pub table_name: String,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("migrations"),
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

impl MigrationsConfig {
    /// Validated ledger table name. An empty value falls back to the default.
    pub fn table(&self) -> Result<TableName> {
        if self.table_name.is_empty() {
            return Ok(TableName::default());
        }
        TableName::parse(self.table_name.as_str())
    }
}
