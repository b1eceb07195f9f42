use thiserror::Error;

use crate::migration::Direction;

pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by a database backend, kept intact so callers can downcast it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported migration direction: {0} (only up migrations can be applied)")]
    UnsupportedDirection(Direction),

    #[error("migration ledger error: failed to {action}: {source}")]
    Store {
        action: String,
        #[source]
        source: BoxError,
    },

    #[error("migration catalog error: {0}")]
    Catalog(String),

    #[error("error applying migration with id {id}, statement '{statement}': {source}")]
    MigrationApply {
        id: String,
        statement: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to begin transaction for migration {id}: {source}")]
    Begin {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to commit migration {id}: {source}")]
    Commit {
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn store(action: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Store {
            action: action.into(),
            source: source.into(),
        }
    }

    /// The migration this error is attributed to, if any.
    pub fn migration_id(&self) -> Option<&str> {
        match self {
            Self::MigrationApply { id, .. } | Self::Begin { id, .. } | Self::Commit { id, .. } => {
                Some(id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::migration::Direction;

    #[test]
    fn error_display_includes_context() {
        let e = Error::UnsupportedDirection(Direction::Down);
        assert_eq!(
            e.to_string(),
            "unsupported migration direction: down (only up migrations can be applied)"
        );

        let e = Error::store("create ledger table", "permission denied");
        assert_eq!(
            e.to_string(),
            "migration ledger error: failed to create ledger table: permission denied"
        );

        let e = Error::Catalog("missing directory".into());
        assert_eq!(e.to_string(), "migration catalog error: missing directory");
    }

    #[test]
    fn apply_error_keeps_statement_and_cause_verbatim() {
        let e = Error::MigrationApply {
            id: "2".into(),
            statement: "this is not a sql query;".into(),
            source: "near \"this\": syntax error".into(),
        };
        assert_eq!(
            e.to_string(),
            "error applying migration with id 2, statement 'this is not a sql query;': near \"this\": syntax error"
        );
        assert_eq!(e.migration_id(), Some("2"));

        let cause = std::error::Error::source(&e).expect("cause is exposed");
        assert_eq!(cause.to_string(), "near \"this\": syntax error");
    }

    #[test]
    fn store_and_catalog_errors_have_no_migration_id() {
        assert!(Error::store("read ledger", "boom").migration_id().is_none());
        assert!(Error::Catalog("boom".into()).migration_id().is_none());
    }
}
