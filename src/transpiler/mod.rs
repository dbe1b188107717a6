//! SQL rendering.
//!
//! [`SqlGenerator`] is the per-dialect visitor; [`Dialect`] names the
//! shipped generators.

pub mod dialect;
pub mod sql;
pub mod traits;

#[cfg(test)]
mod tests;

use crate::ast::{Expression, TableReference};
use crate::query::Select;
pub use dialect::Dialect;
pub use traits::SqlGenerator;

/// Trait for converting AST nodes to SQL.
pub trait ToSql {
    /// Convert this node to a SQL string using default dialect.
    fn to_sql(&self) -> String {
        self.to_sql_with_dialect(Dialect::default())
    }
    /// Convert this node to a SQL string with specific dialect.
    fn to_sql_with_dialect(&self, dialect: Dialect) -> String;
}

impl ToSql for Select {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> String {
        self.build_with_dialect(dialect)
    }
}

impl ToSql for Expression {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> String {
        self.build(dialect.generator().as_ref())
    }
}

impl ToSql for TableReference {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> String {
        self.build(dialect.generator().as_ref())
    }
}
