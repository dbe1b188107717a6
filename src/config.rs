//! Configuration

use crate::error::{SqlError, SqlResult};
use crate::transpiler::Dialect;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI and library defaults, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dialect used when no database URL decides it
    pub dialect: Dialect,

    /// Database connection URL
    pub database_url: Option<String>,

    /// `tracing` filter directive, used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::Canonical,
            database_url: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// `$CONFIG_DIR/sqlcompose/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sqlcompose").join("config.toml"))
    }

    /// Load the default config file, or defaults when there is none.
    pub fn load() -> SqlResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> SqlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| SqlError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> SqlResult<Self> {
        toml::from_str(text).map_err(|e| SqlError::Config(e.to_string()))
    }

    /// Override the file's values with explicitly given ones.
    pub fn merge(mut self, dialect: Option<Dialect>, database_url: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = Some(url);
        }
        if let Some(d) = dialect {
            self.dialect = d;
        } else if let Some(d) = self.database_url.as_deref().and_then(Dialect::from_url) {
            self.dialect = d;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.dialect, Dialect::Canonical);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_parse_full() {
        let config = Config::from_toml_str(
            r#"
            dialect = "postgresql"
            database_url = "postgres://localhost/app"
            log_filter = "sqlcompose=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/app"));
        assert_eq!(config.log_filter, "sqlcompose=debug");
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("dialect = \"oracle\"").unwrap_err();
        assert!(matches!(err, SqlError::Config(_)));
    }

    #[test]
    fn test_merge_prefers_explicit_values() {
        let config = Config::default().merge(None, Some("mysql://db/app".to_string()));
        assert_eq!(config.dialect, Dialect::MySQL);

        let config = Config::default().merge(Some(Dialect::SQLite), Some("mysql://db/app".to_string()));
        assert_eq!(config.dialect, Dialect::SQLite);
    }
}
