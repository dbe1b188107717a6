//! SELECT query builder.

use crate::ast::{
    ChainOp, Expression, JoinCondition, JoinKind, OrderDirection, TableName, TableReference,
    Value,
};
use crate::error::SqlResult;
use crate::query::Query;
use std::collections::{HashMap, HashSet};
use crate::transpiler::{Dialect, SqlGenerator, sql::canonical::CanonicalGenerator};
use tracing::{debug, warn};

/// A mutable SELECT builder.
///
/// Every builder call registers what it attaches in the query's registries
/// before touching any clause; a failing call leaves the builder unchanged.
/// Table qualifiers are checked by [`Select::validate`] once the query is
/// complete, so clauses may name a table before it is joined.
///
/// ```
/// use sqlcompose::prelude::*;
/// use sqlcompose::transpiler::sql::sqlite::SqliteGenerator;
///
/// let mut select = Select::select("t").unwrap();
/// select.and_where(col("c").equals(lit(5))).unwrap();
/// assert_eq!(select.build(&SqliteGenerator), "SELECT * FROM \"t\" WHERE \"c\" = :dbph");
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    query: Query,
    distinct: bool,
    columns: Option<Expression>,
    from: TableReference,
    where_clause: Option<Expression>,
    group_by: Option<Expression>,
    having: Option<Expression>,
    order_by: Option<Expression>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    /// Start a SELECT from `table`.
    pub fn select(table: impl Into<TableName>) -> SqlResult<Self> {
        let table = table.into();
        let mut query = Query::new();
        query.define_table(&table)?;
        Ok(Self {
            query,
            distinct: false,
            columns: None,
            from: TableReference::Table(table),
            where_clause: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
            offset: None,
        })
    }

    pub fn select_as(table: &str, alias: &str) -> SqlResult<Self> {
        Self::select(TableName::aliased(table, alias))
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Placeholder → value pairs for parameter binding, in allocation order.
    ///
    /// Only placeholders that appear in the rendered SQL are returned; the
    /// literals of a HAVING clause without GROUP BY stay registered but are
    /// not bound.
    pub fn arguments(&self) -> Vec<(String, Value)> {
        let rendered: HashSet<&str> = self
            .rendered_clauses()
            .into_iter()
            .flat_map(Expression::placeholders)
            .collect();
        self.query
            .arguments()
            .filter(|(k, _)| rendered.contains(k))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    pub fn argument_map(&self) -> HashMap<String, Value> {
        self.arguments().into_iter().collect()
    }

    /// Check every table qualifier against the tables of the finished query.
    pub fn validate(&self) -> SqlResult<()> {
        self.clauses()
            .into_iter()
            .try_for_each(|expr| self.query.check_qualifiers(expr))
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn columns(&self) -> Option<&Expression> {
        self.columns.as_ref()
    }

    pub fn from(&self) -> &TableReference {
        &self.from
    }

    pub fn where_clause(&self) -> Option<&Expression> {
        self.where_clause.as_ref()
    }

    pub fn group_by_clause(&self) -> Option<&Expression> {
        self.group_by.as_ref()
    }

    pub fn having_clause(&self) -> Option<&Expression> {
        self.having.as_ref()
    }

    pub fn order_by_clause(&self) -> Option<&Expression> {
        self.order_by.as_ref()
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    pub fn add_column(&mut self, expr: impl Into<Expression>) -> SqlResult<&mut Self> {
        let expr = self.attach(expr.into())?;
        append(&mut self.columns, ChainOp::Comma, expr);
        Ok(self)
    }

    /// Add several columns in one mutation of the select list.
    pub fn add_columns(
        &mut self,
        exprs: impl IntoIterator<Item = Expression>,
    ) -> SqlResult<&mut Self> {
        let attached = self.query.staged(|query| {
            exprs
                .into_iter()
                .map(|mut expr| query.register_expression(&mut expr).map(|()| expr))
                .collect::<SqlResult<Vec<_>>>()
        })?;
        append_many(&mut self.columns, ChainOp::Comma, attached);
        Ok(self)
    }

    /// `expr AS alias`; fails if `alias` is already defined for another
    /// expression.
    pub fn add_column_as(
        &mut self,
        expr: impl Into<Expression>,
        alias: &str,
    ) -> SqlResult<&mut Self> {
        let aliased = expr.into().alias(alias)?;
        self.add_column(aliased)
    }

    /// Add `expr` under a freshly allocated alias derived from `base`
    /// (`base`, `base2`, ...). Returns the alias.
    pub fn add_unique_column(
        &mut self,
        expr: impl Into<Expression>,
        base: &str,
    ) -> SqlResult<String> {
        let expr = expr.into();
        let (alias, aliased) = self.query.staged(|query| {
            let alias = query.unique_column_alias(base);
            let mut aliased = expr.alias(alias.as_str())?;
            query.register_expression(&mut aliased)?;
            Ok((alias, aliased))
        })?;
        append(&mut self.columns, ChainOp::Comma, aliased);
        Ok(alias)
    }

    /// Add a WHERE condition, AND-ed with any existing one.
    pub fn and_where(&mut self, expr: impl Into<Expression>) -> SqlResult<&mut Self> {
        let expr = self.attach(expr.into())?;
        append(&mut self.where_clause, ChainOp::And, expr);
        Ok(self)
    }

    pub fn group_by(&mut self, expr: impl Into<Expression>) -> SqlResult<&mut Self> {
        let expr = self.attach(expr.into())?;
        append(&mut self.group_by, ChainOp::Comma, expr);
        Ok(self)
    }

    /// Add a HAVING condition, AND-ed with any existing one. Rendered, and
    /// its arguments bound, only together with GROUP BY.
    pub fn and_having(&mut self, expr: impl Into<Expression>) -> SqlResult<&mut Self> {
        let expr = self.attach(expr.into())?;
        append(&mut self.having, ChainOp::And, expr);
        Ok(self)
    }

    /// Append an ORDER BY item. `direction` must be exactly `ASC` or `DESC`.
    pub fn order_by(
        &mut self,
        expr: impl Into<Expression>,
        direction: &str,
    ) -> SqlResult<&mut Self> {
        let direction: OrderDirection = direction.parse()?;
        self.order_by_direction(expr, direction)
    }

    pub fn order_by_direction(
        &mut self,
        expr: impl Into<Expression>,
        direction: OrderDirection,
    ) -> SqlResult<&mut Self> {
        let ordered = expr.into().order(direction)?;
        let ordered = self.attach(ordered)?;
        append(&mut self.order_by, ChainOp::Comma, ordered);
        Ok(self)
    }

    pub fn order_by_asc(&mut self, expr: impl Into<Expression>) -> SqlResult<&mut Self> {
        self.order_by_direction(expr, OrderDirection::Asc)
    }

    pub fn order_by_desc(&mut self, expr: impl Into<Expression>) -> SqlResult<&mut Self> {
        self.order_by_direction(expr, OrderDirection::Desc)
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Rendered only when a limit is also set.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Join `table` onto the current FROM tree. The previous tree becomes the
    /// left side of the new join.
    pub fn join(
        &mut self,
        kind: JoinKind,
        table: impl Into<TableName>,
        condition: Option<JoinCondition>,
    ) -> SqlResult<&mut Self> {
        let table = table.into();
        let mut condition = condition;
        self.query.staged(|query| {
            query.define_table(&table)?;
            match condition.as_mut() {
                Some(JoinCondition::On(expr)) => query.register_expression(expr),
                _ => Ok(()),
            }
        })?;

        let previous = std::mem::replace(&mut self.from, TableReference::Table(table.clone()));
        self.from = TableReference::join(previous, kind, table, condition);
        Ok(self)
    }

    pub fn inner_join(
        &mut self,
        table: impl Into<TableName>,
        condition: Option<JoinCondition>,
    ) -> SqlResult<&mut Self> {
        self.join(JoinKind::Inner, table, condition)
    }

    pub fn inner_join_on(
        &mut self,
        table: impl Into<TableName>,
        on: impl Into<Expression>,
    ) -> SqlResult<&mut Self> {
        self.join(JoinKind::Inner, table, Some(JoinCondition::On(on.into())))
    }

    /// `INNER JOIN table [AS alias] USING ( columns )`
    pub fn inner_join_using<I, S>(
        &mut self,
        table: &str,
        alias: Option<&str>,
        columns: I,
    ) -> SqlResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join(
            JoinKind::Inner,
            table_by_name(table, alias),
            Some(JoinCondition::using(columns)),
        )
    }

    pub fn left_join(
        &mut self,
        table: impl Into<TableName>,
        condition: Option<JoinCondition>,
    ) -> SqlResult<&mut Self> {
        self.join(JoinKind::Left, table, condition)
    }

    pub fn left_join_on(
        &mut self,
        table: impl Into<TableName>,
        on: impl Into<Expression>,
    ) -> SqlResult<&mut Self> {
        self.join(JoinKind::Left, table, Some(JoinCondition::On(on.into())))
    }

    pub fn left_join_using<I, S>(
        &mut self,
        table: &str,
        alias: Option<&str>,
        columns: I,
    ) -> SqlResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join(
            JoinKind::Left,
            table_by_name(table, alias),
            Some(JoinCondition::using(columns)),
        )
    }

    /// Render through `dialect`. Rendering has no effect on the builder and
    /// repeated calls produce identical output.
    pub fn build<D: SqlGenerator + ?Sized>(&self, dialect: &D) -> String {
        if self.offset.is_some() && self.limit.is_none() {
            warn!(offset = ?self.offset, "OFFSET without LIMIT is not rendered");
        }
        if self.having.is_some() && self.group_by.is_none() {
            warn!("HAVING without GROUP BY is not rendered");
        }
        let sql = dialect.build_select(self);
        debug!(dialect = dialect.name(), %sql, "built select");
        sql
    }

    pub fn build_with_dialect(&self, dialect: Dialect) -> String {
        self.build(dialect.generator().as_ref())
    }

    /// Dialect-free rendering for logs and diagnostics.
    pub fn to_canonical_string(&self) -> String {
        self.build(&CanonicalGenerator)
    }

    /// Register `expr`, keeping its registrations only when all succeed.
    fn attach(&mut self, mut expr: Expression) -> SqlResult<Expression> {
        self.query.staged(|query| query.register_expression(&mut expr))?;
        Ok(expr)
    }

    /// Every expression held by the builder, rendered or not.
    fn clauses(&self) -> Vec<&Expression> {
        let mut out = self.rendered_clauses();
        if self.group_by.is_none() {
            out.extend(self.having.as_ref());
        }
        out
    }

    fn rendered_clauses(&self) -> Vec<&Expression> {
        let mut out: Vec<&Expression> = self.columns.iter().collect();
        out.extend(self.from.on_conditions());
        out.extend(self.where_clause.as_ref());
        if let Some(group_by) = &self.group_by {
            out.push(group_by);
            out.extend(self.having.as_ref());
        }
        out.extend(self.order_by.as_ref());
        out
    }
}

impl std::fmt::Display for Select {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

fn table_by_name(table: &str, alias: Option<&str>) -> TableName {
    match alias {
        Some(a) => TableName::aliased(table, a),
        None => TableName::new(table),
    }
}

fn append(slot: &mut Option<Expression>, op: ChainOp, expr: Expression) {
    *slot = Some(match slot.take() {
        Some(existing) => existing.chain(op, expr),
        None => expr,
    });
}

fn append_many(slot: &mut Option<Expression>, op: ChainOp, exprs: Vec<Expression>) {
    let mut iter = exprs.into_iter();
    let current = match slot.take().or_else(|| iter.next()) {
        Some(e) => e,
        None => return,
    };
    let mut rest = iter.collect::<Vec<_>>();
    *slot = Some(match current {
        Expression::Chain(mut infix) if infix.op == op => {
            infix.add_many_to_sequence(rest);
            Expression::Chain(infix)
        }
        other if rest.is_empty() => other,
        other => {
            let first = rest.remove(0);
            let mut chain = crate::ast::Infix::new(other, op, first);
            chain.add_many_to_sequence(rest);
            Expression::Chain(chain)
        }
    });
}
