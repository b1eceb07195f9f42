use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ledger table used when no name is configured.
pub const DEFAULT_TABLE_NAME: &str = "database_migrations";

const MAX_TABLE_NAME_LEN: usize = 64;

/// A named, ordered set of statements applied at most once.
///
/// The `id` is the only key the engine looks at: it decides whether the
/// migration already ran. Ordering is whatever order the catalog returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    pub id: String,
    pub up: Vec<String>,
    #[serde(default)]
    pub down: Vec<String>,
}

impl Migration {
    pub fn new<I, S>(id: impl Into<String>, up: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            up: up.into_iter().map(Into::into).collect(),
            down: Vec::new(),
        }
    }

    pub fn with_down<I, S>(mut self, down: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.down = down.into_iter().map(Into::into).collect();
        self
    }
}

/// A row of the ledger table: this migration ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    pub id: String,
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(Error::Config(format!("unknown migration direction: {other}"))),
        }
    }
}

/// Name of the ledger table.
///
/// The name is spliced into DDL/DML text, so only plain identifiers are
/// accepted: an ASCII letter or underscore followed by letters, digits or
/// underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Config("ledger table name must not be empty".into()));
        }
        if name.len() > MAX_TABLE_NAME_LEN {
            return Err(Error::Config(format!(
                "ledger table name '{name}' is longer than {MAX_TABLE_NAME_LEN} characters"
            )));
        }

        let mut chars = name.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::Config(format!(
                "ledger table name '{name}' is not a plain SQL identifier"
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TableName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_builder_collects_statements() {
        let m = Migration::new("0001_users", ["CREATE TABLE users (id INTEGER)"])
            .with_down(["DROP TABLE users"]);
        assert_eq!(m.id, "0001_users");
        assert_eq!(m.up, vec!["CREATE TABLE users (id INTEGER)".to_string()]);
        assert_eq!(m.down, vec!["DROP TABLE users".to_string()]);
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("down".parse::<Direction>().unwrap(), Direction::Down);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn default_table_name() {
        assert_eq!(TableName::default().as_str(), "database_migrations");
    }

    #[test]
    fn table_name_accepts_identifiers() {
        for name in ["schema_migrations", "_ledger", "m2"] {
            assert_eq!(TableName::parse(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn table_name_rejects_unsafe_input() {
        for name in [
            "",
            "2fast",
            "drop table x; --",
            "my-table",
            "`quoted`",
            "ledger\"",
        ] {
            assert!(TableName::parse(name).is_err(), "{name:?} should be rejected");
        }
        assert!(TableName::parse("a".repeat(65)).is_err());
    }

    #[test]
    fn table_name_deserializes_with_validation() {
        let ok: TableName = serde_json::from_str("\"applied\"").unwrap();
        assert_eq!(ok.as_str(), "applied");
        assert!(serde_json::from_str::<TableName>("\"bad name\"").is_err());
    }
}
