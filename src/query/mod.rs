//! Query registries and the registration walk.
//!
//! Attaching an expression or table to a query registers everything it
//! names: table aliases, column aliases and one placeholder per literal.
//! Table qualifiers are checked separately, over the finished query.

pub mod select;

pub use select::Select;

use crate::ast::{BinaryOp, Expression, Infix, TableName, TableReference, Value};
use crate::error::{AliasKind, EntityKind, SqlError, SqlResult};
use crate::registry::{AliasRegistry, Binding, RegistryMark};
use std::collections::HashMap;

/// Base token for argument placeholders: `:dbph`, `:dbph2`, ...
pub const PLACEHOLDER_BASE: &str = ":dbph";

/// The expression a column alias stands for, kept without placeholder
/// tokens so two copies of the same expression compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAliasBinding {
    pub expression: Expression,
}

impl ColumnAliasBinding {
    pub fn new(expression: &Expression) -> Self {
        Self {
            expression: expression.without_placeholders(),
        }
    }
}

impl Binding for ColumnAliasBinding {
    fn same_binding(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Binding for TableName {
    fn same_binding(&self, other: &Self) -> bool {
        self.is_same_table(other)
    }
}

impl Binding for Value {
    fn same_binding(&self, other: &Self) -> bool {
        self == other
    }
}

/// Registry positions to roll back to when a staged registration fails.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    column_aliases: RegistryMark,
    table_aliases: RegistryMark,
    arguments: RegistryMark,
}

/// Alias and placeholder registries shared by every clause of one query.
#[derive(Debug, Clone)]
pub struct Query {
    column_aliases: AliasRegistry<ColumnAliasBinding>,
    table_aliases: AliasRegistry<TableName>,
    arguments: AliasRegistry<Value>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Self {
            column_aliases: AliasRegistry::new(AliasKind::Column),
            table_aliases: AliasRegistry::new(AliasKind::Table),
            arguments: AliasRegistry::new(AliasKind::Placeholder),
        }
    }

    pub fn column_aliases(&self) -> &AliasRegistry<ColumnAliasBinding> {
        &self.column_aliases
    }

    pub fn table_aliases(&self) -> &AliasRegistry<TableName> {
        &self.table_aliases
    }

    pub fn unique_column_alias(&mut self, base: &str) -> String {
        self.column_aliases.reserve_unique(base)
    }

    pub fn unique_table_alias(&mut self, base: &str) -> String {
        self.table_aliases.reserve_unique(base)
    }

    pub fn unique_placeholder(&mut self) -> String {
        self.arguments.reserve_unique(PLACEHOLDER_BASE)
    }

    pub fn define_column_alias(&mut self, name: &str, expression: &Expression) -> SqlResult<()> {
        self.column_aliases
            .define(name, ColumnAliasBinding::new(expression))
    }

    /// Register a table under its reference name. Registering the same table
    /// object again is a no-op.
    pub fn define_table(&mut self, table: &TableName) -> SqlResult<()> {
        self.table_aliases
            .define(table.reference_name(), table.clone())
    }

    pub fn define_argument(&mut self, placeholder: &str, value: Value) -> SqlResult<()> {
        self.arguments.define(placeholder, value)
    }

    /// Bound value of a placeholder.
    pub fn argument(&self, placeholder: &str) -> Option<&Value> {
        self.arguments.get(placeholder)
    }

    /// Placeholder → value pairs in allocation order.
    pub fn arguments(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.arguments.iter()
    }

    pub fn argument_map(&self) -> HashMap<String, Value> {
        self.arguments
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            column_aliases: self.column_aliases.mark(),
            table_aliases: self.table_aliases.mark(),
            arguments: self.arguments.mark(),
        }
    }

    /// Drop every name reserved or defined since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.column_aliases.rollback(checkpoint.column_aliases);
        self.table_aliases.rollback(checkpoint.table_aliases);
        self.arguments.rollback(checkpoint.arguments);
    }

    /// Run `f` against the registries, keeping its registrations only when
    /// it succeeds.
    pub fn staged<R>(&mut self, f: impl FnOnce(&mut Query) -> SqlResult<R>) -> SqlResult<R> {
        let checkpoint = self.checkpoint();
        let result = f(self);
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    pub fn register_table_reference(&mut self, from: &TableReference) -> SqlResult<()> {
        for table in from.tables() {
            self.define_table(table)?;
        }
        Ok(())
    }

    /// Register an expression tree, assigning placeholders to its literals.
    pub fn register_expression(&mut self, expr: &mut Expression) -> SqlResult<()> {
        match expr {
            Expression::AllColumns(_) | Expression::Column(_) => Ok(()),
            Expression::Literal(literal) => {
                if let Value::Float(f) = literal.value {
                    if !f.is_finite() {
                        return Err(SqlError::illegal("literal", f));
                    }
                }
                if let Some(token) = literal.placeholder() {
                    if self.arguments.get(token) == Some(&literal.value) {
                        return Ok(());
                    }
                }
                let token = self.unique_placeholder();
                self.define_argument(&token, literal.value.clone())?;
                literal.set_placeholder(token);
                Ok(())
            }
            Expression::Table(table) => self.define_table(table),
            Expression::Function(f) => {
                for arg in f.args.iter_mut() {
                    self.register_expression(arg)?;
                }
                Ok(())
            }
            Expression::Chain(infix) => {
                self.register_expression(&mut infix.left)?;
                self.register_expression(&mut infix.right)
            }
            Expression::Binary(Infix {
                left,
                op: BinaryOp::Alias,
                right,
            }) => {
                self.register_expression(left)?;
                let alias = match &**right {
                    Expression::Column(c) => c.name.clone(),
                    other => return Err(SqlError::illegal("column alias", format!("{:?}", other))),
                };
                self.define_column_alias(&alias, &**left)
            }
            Expression::Binary(infix) => {
                self.register_expression(&mut infix.left)?;
                self.register_expression(&mut infix.right)
            }
            Expression::Prefix(p) => self.register_expression(&mut p.right),
            Expression::Postfix(p) => self.register_expression(&mut p.left),
        }
    }

    /// Fail with `NoSuchEntity` on the first `t.c` or `t.*` whose qualifier
    /// is not a table registered in this query.
    pub fn check_qualifiers(&self, expr: &Expression) -> SqlResult<()> {
        let mut unknown = None;
        expr.walk(&mut |node| {
            let qualifier = match node {
                Expression::AllColumns(Some(table)) => Some(table.as_str()),
                Expression::Column(c) => c.table.as_deref(),
                _ => None,
            };
            if let Some(table) = qualifier {
                if unknown.is_none() && !self.table_aliases.is_reserved(table) {
                    unknown = Some(table);
                }
            }
        });
        match unknown {
            Some(table) => Err(SqlError::no_such(EntityKind::Table, table)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::*;

    #[test]
    fn test_literal_gets_placeholder() {
        let mut query = Query::new();
        let mut expr = col("c").equals(lit(5));
        query.register_expression(&mut expr).unwrap();

        match &expr {
            Expression::Binary(infix) => match infix.right.as_ref() {
                Expression::Literal(l) => assert_eq!(l.placeholder(), Some(":dbph")),
                other => panic!("expected literal, got {:?}", other),
            },
            other => panic!("expected binary, got {:?}", other),
        }
        assert_eq!(query.argument(":dbph"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_placeholders_are_unique() {
        let mut query = Query::new();
        let mut expr = col("a").equals(lit(1)).and(col("b").equals(lit(2))).and(col("c").equals(lit("x")));
        query.register_expression(&mut expr).unwrap();

        let args: Vec<_> = query.arguments().map(|(k, v)| (k.to_string(), v.clone())).collect();
        assert_eq!(
            args,
            vec![
                (":dbph".to_string(), Value::Int(1)),
                (":dbph2".to_string(), Value::Int(2)),
                (":dbph3".to_string(), Value::String("x".into())),
            ]
        );
    }

    #[test]
    fn test_reregistering_same_literal_keeps_token() {
        let mut query = Query::new();
        let mut expr = col("a").equals(lit(1));
        query.register_expression(&mut expr).unwrap();
        let mut again = expr.clone();
        query.register_expression(&mut again).unwrap();
        assert_eq!(expr, again);
        assert_eq!(query.arguments().count(), 1);
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let mut query = Query::new();
        let mut expr = col("a").equals(lit(f64::NAN));
        let err = query.register_expression(&mut expr).unwrap_err();
        assert!(matches!(err, SqlError::IllegalValue { .. }));
    }

    #[test]
    fn test_unknown_table_qualifier() {
        let mut query = Query::new();
        query.define_table(&TableName::new("users")).unwrap();
        let mut expr = table_col("users", "id")
            .equals(table_col("ghost", "id"))
            .and(all_columns_of("ghost"));
        query.register_expression(&mut expr).unwrap();

        let err = query.check_qualifiers(&expr).unwrap_err();
        assert!(matches!(
            err,
            SqlError::NoSuchEntity { kind: EntityKind::Table, ref name } if name == "ghost"
        ));

        query.define_table(&TableName::new("ghost")).unwrap();
        query.check_qualifiers(&expr).unwrap();
    }

    #[test]
    fn test_staged_failure_rolls_back_registrations() {
        let mut query = Query::new();
        let mut taken = col("a").alias("x").unwrap();
        query.register_expression(&mut taken).unwrap();

        let err = query
            .staged(|q| {
                let mut expr = col("b").equals(lit(1)).alias("y").unwrap();
                q.register_expression(&mut expr)?;
                let mut clash = col("c").equals(lit(2)).alias("x").unwrap();
                q.register_expression(&mut clash)
            })
            .unwrap_err();
        assert!(matches!(err, SqlError::DuplicateAlias { kind: AliasKind::Column, .. }));
        assert_eq!(query.arguments().count(), 0);
        assert!(!query.column_aliases().is_reserved("y"));
        assert_eq!(query.unique_placeholder(), ":dbph");
    }

    #[test]
    fn test_same_table_twice_is_idempotent() {
        let mut query = Query::new();
        let users = TableName::new("users");
        query.define_table(&users).unwrap();
        query.define_table(&users.clone()).unwrap();

        let other = TableName::new("users");
        let err = query.define_table(&other).unwrap_err();
        assert!(matches!(err, SqlError::DuplicateAlias { kind: AliasKind::Table, .. }));
    }

    #[test]
    fn test_column_alias_duplicate() {
        let mut query = Query::new();
        let mut first = col("a").alias("x").unwrap();
        query.register_expression(&mut first).unwrap();
        let mut same = col("a").alias("x").unwrap();
        query.register_expression(&mut same).unwrap();

        let mut different = col("b").alias("x").unwrap();
        let err = query.register_expression(&mut different).unwrap_err();
        assert!(matches!(err, SqlError::DuplicateAlias { kind: AliasKind::Column, .. }));
    }

    #[test]
    fn test_literal_alias_identity_ignores_placeholders() {
        let mut query = Query::new();
        let mut first = lit(1).alias("y").unwrap();
        query.register_expression(&mut first).unwrap();
        let mut second = lit(1).alias("y").unwrap();
        query.register_expression(&mut second).unwrap();
        assert_eq!(query.arguments().count(), 2);

        let mut other = lit(2).alias("y").unwrap();
        let err = query.register_expression(&mut other).unwrap_err();
        assert!(matches!(err, SqlError::DuplicateAlias { kind: AliasKind::Column, .. }));
    }
}
