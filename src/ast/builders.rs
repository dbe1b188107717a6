//! Shorthand constructors for expression trees.
//!
//! ```
//! use sqlcompose::ast::builders::*;
//!
//! let cond = col("age").ge(lit(21)).and(col("deleted_at").is_null());
//! assert_eq!(cond.to_array().len(), 2);
//! ```

use crate::ast::{ColumnName, Expression, Function, Literal, TableName, Value};

/// Unqualified column reference.
pub fn col(name: &str) -> Expression {
    Expression::Column(ColumnName::new(name))
}

/// Column qualified by a table name or alias.
pub fn table_col(table: &str, name: &str) -> Expression {
    Expression::Column(ColumnName::qualified(table, name))
}

/// `*`
pub fn all_columns() -> Expression {
    Expression::AllColumns(None)
}

/// `table.*`
pub fn all_columns_of(table: &str) -> Expression {
    Expression::AllColumns(Some(table.to_string()))
}

pub fn lit(value: impl Into<Value>) -> Expression {
    Expression::Literal(Literal::new(value))
}

pub fn null() -> Expression {
    Expression::Literal(Literal::null())
}

pub fn table(name: &str) -> Expression {
    Expression::Table(TableName::new(name))
}

pub fn func(name: &str, args: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::Function(Function::new(name, args))
}

/// `COUNT(expr)`
pub fn count(expr: Expression) -> Expression {
    func("COUNT", [expr])
}

/// `COUNT(*)`
pub fn count_all() -> Expression {
    count(all_columns())
}

pub fn sum(expr: Expression) -> Expression {
    func("SUM", [expr])
}

pub fn max(expr: Expression) -> Expression {
    func("MAX", [expr])
}

pub fn min(expr: Expression) -> Expression {
    func("MIN", [expr])
}

/// AND of every condition; `None` when the list is empty.
pub fn all_of(conditions: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    conditions.into_iter().reduce(|acc, c| acc.and(c))
}

/// OR of every condition; `None` when the list is empty.
pub fn any_of(conditions: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    conditions.into_iter().reduce(|acc, c| acc.or(c))
}
