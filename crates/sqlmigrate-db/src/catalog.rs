use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sqlmigrate_common::{Error, Migration, Result};
use tracing::debug;

const UP_SUFFIX: &str = ".up.sql";
const DOWN_SUFFIX: &str = ".down.sql";

/// Supplies every known migration in the order they should be applied.
pub trait MigrationSource {
    fn find_migrations(&self) -> Result<Vec<Migration>>;
}

/// Returns the migrations it was built with, as-is.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    migrations: Vec<Migration>,
}

impl MemorySource {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }
}

impl From<Vec<Migration>> for MemorySource {
    fn from(migrations: Vec<Migration>) -> Self {
        Self::new(migrations)
    }
}

impl MigrationSource for MemorySource {
    fn find_migrations(&self) -> Result<Vec<Migration>> {
        Ok(self.migrations.clone())
    }
}

/// Loads migrations from `<id>.up.sql` / `<id>.down.sql` file pairs.
///
/// Migrations are ordered by id, compared byte-wise, so zero-padded or
/// timestamp prefixes sort as expected. Other files are ignored.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Default)]
struct ScriptPair {
    up: Option<PathBuf>,
    down: Option<PathBuf>,
}

impl MigrationSource for DirectorySource {
    fn find_migrations(&self) -> Result<Vec<Migration>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            Error::Catalog(format!(
                "failed to read migrations directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut scripts: BTreeMap<String, ScriptPair> = BTreeMap::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::Catalog(format!("failed to read directory entry: {e}")))?
                .path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
                continue;
            };

            if let Some(id) = file_name.strip_suffix(UP_SUFFIX) {
                scripts.entry(id.to_string()).or_default().up = Some(path.clone());
            } else if let Some(id) = file_name.strip_suffix(DOWN_SUFFIX) {
                scripts.entry(id.to_string()).or_default().down = Some(path.clone());
            }
        }

        let mut migrations = Vec::with_capacity(scripts.len());
        for (id, pair) in scripts {
            if id.is_empty() {
                return Err(Error::Catalog(format!(
                    "migration script in {} has an empty id",
                    self.dir.display()
                )));
            }
            let Some(up_path) = pair.up else {
                return Err(Error::Catalog(format!(
                    "migration {id} has a down script but no {id}{UP_SUFFIX}"
                )));
            };

            let up = split_statements(&read_script(&up_path)?);
            let down = match pair.down {
                Some(path) => split_statements(&read_script(&path)?),
                None => Vec::new(),
            };
            debug!("loaded migration {id} ({} up statements)", up.len());
            migrations.push(Migration { id, up, down });
        }

        Ok(migrations)
    }
}

fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::Catalog(format!("failed to read {}: {e}", path.display())))
}

/// Split a script into statements on `;`.
///
/// Semicolons inside quoted strings, quoted identifiers and comments are
/// ignored. Chunks holding nothing but whitespace and comments are dropped.
/// Statements with embedded `;` such as trigger bodies are not supported.
pub fn split_statements(script: &str) -> Vec<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Quoted(char),
        LineComment,
        BlockComment,
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut state = State::Code;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                ';' => {
                    if has_code {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                    has_code = false;
                    continue;
                }
                '\'' | '"' | '`' => {
                    state = State::Quoted(c);
                    has_code = true;
                }
                '-' if chars.peek() == Some(&'-') => state = State::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    current.push(c);
                    if let Some(star) = chars.next() {
                        current.push(star);
                    }
                    state = State::BlockComment;
                    continue;
                }
                c if !c.is_whitespace() => has_code = true,
                _ => {}
            },
            State::Quoted(quote) => {
                if c == quote {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    current.push(c);
                    if let Some(slash) = chars.next() {
                        current.push(slash);
                    }
                    state = State::Code;
                    continue;
                }
            }
        }
        current.push(c);
    }

    if has_code {
        statements.push(current.trim().to_string());
    }
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_returns_migrations_verbatim() {
        let migrations = vec![
            Migration::new("2", ["SELECT 2"]),
            Migration::new("1", ["SELECT 1"]),
        ];
        let source = MemorySource::from(migrations.clone());
        assert_eq!(source.find_migrations().unwrap(), migrations);
    }

    #[test]
    fn split_on_semicolons() {
        let stmts = split_statements(
            "CREATE TABLE a (id INTEGER);\n\nCREATE TABLE b (id INTEGER);\n",
        );
        assert_eq!(
            stmts,
            vec!["CREATE TABLE a (id INTEGER)", "CREATE TABLE b (id INTEGER)"]
        );
    }

    #[test]
    fn split_keeps_trailing_statement_without_semicolon() {
        assert_eq!(
            split_statements("SELECT 1; SELECT 2"),
            vec!["SELECT 1", "SELECT 2"]
        );
    }

    #[test]
    fn split_ignores_semicolons_in_quotes_and_comments() {
        let script = "-- leading; comment\n\
                      INSERT INTO t VALUES ('a;b', \"c;d\");\n\
                      /* block; comment */ INSERT INTO t VALUES ('it''s');";
        let stmts = split_statements(script);
        assert_eq!(stmts.len(), 2);
        assert_eq!(
            stmts[0],
            "-- leading; comment\nINSERT INTO t VALUES ('a;b', \"c;d\")"
        );
        assert_eq!(
            stmts[1],
            "/* block; comment */ INSERT INTO t VALUES ('it''s')"
        );
    }

    #[test]
    fn split_drops_comment_only_chunks() {
        assert!(split_statements("-- nothing here\n;\n/* still nothing */").is_empty());
        assert!(split_statements("   ;;  ").is_empty());
    }

    #[test]
    fn directory_source_orders_by_id_and_pairs_scripts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("0002_posts.up.sql"),
            "CREATE TABLE posts (id INTEGER);",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("0001_users.up.sql"),
            "CREATE TABLE users (id INTEGER);\nCREATE INDEX idx_users ON users(id);",
        )
        .unwrap();
        std::fs::write(dir.path().join("0001_users.down.sql"), "DROP TABLE users;").unwrap();
        std::fs::write(dir.path().join("README.md"), "not a migration").unwrap();

        let migrations = DirectorySource::new(dir.path()).find_migrations().unwrap();
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].id, "0001_users");
        assert_eq!(migrations[0].up.len(), 2);
        assert_eq!(migrations[0].down, vec!["DROP TABLE users"]);
        assert_eq!(migrations[1].id, "0002_posts");
        assert!(migrations[1].down.is_empty());
    }

    #[test]
    fn directory_source_rejects_orphan_down_script() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0001.down.sql"), "DROP TABLE x;").unwrap();

        let err = DirectorySource::new(dir.path()).find_migrations().unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
        assert!(err.to_string().contains("0001"), "{err}");
    }

    #[test]
    fn missing_directory_is_catalog_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path().join("does-not-exist"));
        assert!(matches!(source.find_migrations(), Err(Error::Catalog(_))));
    }
}
