//! Error types for sqlcompose.

use std::fmt;
use thiserror::Error;

/// Which registry an alias collision happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    Column,
    Table,
    Placeholder,
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasKind::Column => write!(f, "column"),
            AliasKind::Table => write!(f, "table"),
            AliasKind::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Kind of schema or query entity that could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Table,
    Column,
    Index,
    Database,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Table => write!(f, "table"),
            EntityKind::Column => write!(f, "column"),
            EntityKind::Index => write!(f, "index"),
            EntityKind::Database => write!(f, "database"),
        }
    }
}

/// The main error type for sqlcompose operations.
///
/// Builder errors are raised at the point of construction; a query that
/// produced one of them must not be rendered.
#[derive(Debug, Error)]
pub enum SqlError {
    /// An alias or placeholder name is already bound to a different object.
    #[error("Duplicate {kind} alias: '{name}'")]
    DuplicateAlias { kind: AliasKind, name: String },

    #[error("Illegal value for {context}: {value}")]
    IllegalValue { context: String, value: String },

    /// Schema mutation that has no implementation.
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    #[error("No such {kind}: '{name}'")]
    NoSuchEntity { kind: EntityKind, name: String },

    /// Sort direction other than exactly `ASC` or `DESC`.
    #[error("Invalid order direction: '{given}'. Expected: ASC or DESC")]
    InvalidOrderDirection { given: String },

    /// Re-ordering an ORDER BY node or re-aliasing an aliased expression.
    #[error("Invalid chain target: {message}")]
    InvalidChainTarget { message: String },

    /// Failed to parse a textual condition or select item.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlError {
    pub fn duplicate(kind: AliasKind, name: impl Into<String>) -> Self {
        Self::DuplicateAlias {
            kind,
            name: name.into(),
        }
    }

    pub fn illegal(context: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::IllegalValue {
            context: context.into(),
            value: value.to_string(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    pub fn no_such(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NoSuchEntity {
            kind,
            name: name.into(),
        }
    }

    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias for sqlcompose operations.
pub type SqlResult<T> = Result<T, SqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SqlError::duplicate(AliasKind::Column, "total");
        assert_eq!(err.to_string(), "Duplicate column alias: 'total'");

        let err = SqlError::no_such(EntityKind::Table, "users");
        assert_eq!(err.to_string(), "No such table: 'users'");

        let err = SqlError::parse(5, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unexpected character"
        );
    }
}
