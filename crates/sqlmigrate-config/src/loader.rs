use std::path::Path;

use sqlmigrate_common::{Error, Result};
use tracing::info;

use crate::model::AppConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a `.yml`/`.yaml` or `.toml` config file and validate it.
    pub fn load(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = Self::parse(&contents, ext)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<AppConfig> {
        let config: AppConfig = match ext {
            "yml" | "yaml" => serde_yaml::from_str(contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        config.migrations.table()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn parses_yaml() {
        let config = ConfigLoader::parse(
            "database:\n  path: /var/lib/app.db\nmigrations:\n  directory: db/migrations\n  table_name: schema_log\n",
            "yaml",
        )
        .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/var/lib/app.db"));
        assert_eq!(config.migrations.directory, PathBuf::from("db/migrations"));
        assert_eq!(config.migrations.table().unwrap().as_str(), "schema_log");
    }

    #[test]
    fn parses_toml_with_defaults() {
        let config = ConfigLoader::parse("[database]\npath = \"app.db\"\n", "toml").unwrap();
        assert_eq!(config.database.path, PathBuf::from("app.db"));
        assert_eq!(config.migrations.table_name, "database_migrations");
    }

    #[test]
    fn rejects_unsafe_table_name() {
        let err = ConfigLoader::parse(
            "[migrations]\ntable_name = \"x; DROP TABLE users\"\n",
            "toml",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = ConfigLoader::parse("{}", "json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: unsupported config extension: json"
        );
    }

    #[test]
    fn load_reads_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlmigrate.yml");
        std::fs::write(&path, "migrations:\n  directory: sql\n").unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.migrations.directory, PathBuf::from("sql"));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
