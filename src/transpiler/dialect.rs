use crate::error::SqlError;
use crate::transpiler::sql::canonical::CanonicalGenerator;
use crate::transpiler::sql::mysql::MysqlGenerator;
use crate::transpiler::sql::postgres::PostgresGenerator;
use crate::transpiler::sql::sqlite::SqliteGenerator;
use crate::transpiler::traits::SqlGenerator;
use serde::Deserialize;
use std::str::FromStr;

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Backend-free rendering for display
    #[default]
    Canonical,
    #[serde(alias = "mariadb")]
    MySQL,
    SQLite,
    #[serde(alias = "postgresql")]
    Postgres,
}

impl Dialect {
    pub fn generator(&self) -> Box<dyn SqlGenerator> {
        match self {
            Dialect::Canonical => Box::new(CanonicalGenerator),
            Dialect::MySQL => Box::new(MysqlGenerator),
            Dialect::SQLite => Box::new(SqliteGenerator),
            Dialect::Postgres => Box::new(PostgresGenerator),
        }
    }

    /// Infer the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Dialect> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Some(Dialect::MySQL),
            "sqlite" => Some(Dialect::SQLite),
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            _ => None,
        }
    }
}

impl FromStr for Dialect {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "canonical" => Ok(Dialect::Canonical),
            "mysql" | "mariadb" => Ok(Dialect::MySQL),
            "sqlite" => Ok(Dialect::SQLite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            _ => Err(SqlError::illegal("dialect", s)),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.generator().name())
    }
}
