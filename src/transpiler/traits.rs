//! The dialect visitor.
//!
//! Nodes never render themselves: `Expression::build` dispatches to the one
//! `build_*` method matching the node kind. Every method has a default
//! structural rendering built on the dialect primitives (`quote_identifier`,
//! `quote_string_literal`, `bool_literal`), so a dialect only overrides what
//! differs. The defaults are also exposed as free functions so an override
//! can fall back to them.

use crate::ast::{
    BinaryOp, ChainOp, ColumnName, Expression, Function, Infix, Join, JoinCondition, JoinKind,
    Literal, Operator, Postfix, Prefix, TableName, Value,
};
use crate::error::{SqlError, SqlResult};
use crate::query::Select;
use crate::schema::{Column, ColumnType, Size, Table};

/// Trait for dialect-specific SQL generation.
pub trait SqlGenerator {
    /// Dialect name, for logs.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column or alias name).
    fn quote_identifier(&self, name: &str) -> String;

    /// Quote a string literal.
    fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Positional parameter marker for execution (e.g., `?`, `$1`).
    fn placeholder(&self, index: usize) -> String;

    /// Get the boolean literal (true/false vs 1/0).
    fn bool_literal(&self, val: bool) -> String;

    fn build_all_columns(&self, table: Option<&str>) -> String {
        match table {
            Some(t) => format!("{}.*", self.quote_identifier(t)),
            None => "*".to_string(),
        }
    }

    fn build_column_name(&self, column: &ColumnName) -> String {
        match &column.table {
            Some(t) => format!(
                "{}.{}",
                self.quote_identifier(t),
                self.quote_identifier(&column.name)
            ),
            None => self.quote_identifier(&column.name),
        }
    }

    /// Attached literals render their placeholder token.
    fn build_literal(&self, literal: &Literal) -> String {
        match literal.placeholder() {
            Some(token) => token.to_string(),
            None => self.build_value(&literal.value),
        }
    }

    /// Inline SQL text of a value.
    fn build_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => self.bool_literal(*b),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => self.quote_string_literal(s),
        }
    }

    fn build_table_name(&self, table: &TableName) -> String {
        match &table.alias {
            Some(alias) => format!(
                "{} AS {}",
                self.quote_identifier(&table.name),
                self.quote_identifier(alias)
            ),
            None => self.quote_identifier(&table.name),
        }
    }

    fn build_function(&self, function: &Function) -> String {
        let args: Vec<String> = function.args.iter().map(|a| a.build(self)).collect();
        format!("{}({})", function.name, args.join(", "))
    }

    fn build_chain(&self, infix: &Infix<ChainOp>) -> String {
        let prec = infix.op.precedence();
        let left = build_operand(self, &infix.left, prec, false);
        let right = build_operand(self, &infix.right, prec, false);
        if infix.op.space_before() {
            format!("{} {} {}", left, infix.op.symbol(), right)
        } else {
            format!("{}{} {}", left, infix.op.symbol(), right)
        }
    }

    fn build_binary(&self, infix: &Infix<BinaryOp>) -> String {
        let prec = infix.op.precedence();
        let left = build_operand(self, &infix.left, prec, false);
        let right = build_operand(self, &infix.right, prec, true);
        format!("{} {} {}", left, infix.op.symbol(), right)
    }

    fn build_prefix(&self, prefix: &Prefix) -> String {
        let right = build_operand(self, &prefix.right, prefix.op.precedence(), true);
        if prefix.op.space_after() {
            format!("{} {}", prefix.op.symbol(), right)
        } else if right.starts_with('-') {
            // `--` opens a comment
            format!("{}({})", prefix.op.symbol(), right)
        } else {
            format!("{}{}", prefix.op.symbol(), right)
        }
    }

    fn build_postfix(&self, postfix: &Postfix) -> String {
        let left = build_operand(self, &postfix.left, postfix.op.precedence(), false);
        format!("{} {}", left, postfix.op.symbol())
    }

    fn build_inner_join(&self, join: &Join) -> String {
        build_join_default(self, join)
    }

    fn build_left_join(&self, join: &Join) -> String {
        build_join_default(self, join)
    }

    fn build_join_condition(&self, condition: &JoinCondition) -> String {
        match condition {
            JoinCondition::On(expr) => format!("ON {}", expr.build(self)),
            JoinCondition::Using(columns) => {
                let cols: Vec<String> = columns
                    .iter()
                    .map(|c| self.quote_identifier(&c.name))
                    .collect();
                format!("USING ( {} )", cols.join(", "))
            }
        }
    }

    /// OFFSET is only emitted together with LIMIT.
    fn build_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut sql = String::new();
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
            if let Some(m) = offset {
                sql.push_str(&format!(" OFFSET {}", m));
            }
        }
        sql
    }

    fn build_select(&self, select: &Select) -> String {
        build_select_default(self, select)
    }

    /// Integer column keyword for a storage size.
    fn build_integer(&self, size: Size) -> String {
        match size {
            Size::Tiny | Size::Small => "SMALLINT".to_string(),
            Size::Medium | Size::Normal => "INTEGER".to_string(),
            Size::Big => "BIGINT".to_string(),
        }
    }

    fn build_type(&self, column_type: &ColumnType) -> SqlResult<String> {
        build_type_default(self, column_type)
    }

    fn build_column_definition(&self, column: &Column) -> SqlResult<String> {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.build_type(&column.column_type)?
        );
        if !column.allows_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.build_value(default));
        }
        Ok(sql)
    }

    fn build_create_table(&self, table: &Table) -> SqlResult<String> {
        if table.columns.is_empty() {
            return Err(SqlError::illegal("table definition", format!("'{}' has no columns", table.name)));
        }
        let columns = table
            .columns
            .iter()
            .map(|c| self.build_column_definition(c))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(format!(
            "CREATE TABLE {} ({})",
            self.quote_identifier(&table.name),
            columns.join(", ")
        ))
    }

    fn build_drop_table(&self, name: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(name))
    }
}

/// Render `expr` as an operand of an operator with precedence `parent`,
/// parenthesising looser-binding operands. `strict` also parenthesises
/// operands of equal precedence.
pub fn build_operand<D: SqlGenerator + ?Sized>(
    dialect: &D,
    expr: &Expression,
    parent: u8,
    strict: bool,
) -> String {
    let sql = expr.build(dialect);
    let prec = expr.precedence();
    if prec < parent || (strict && prec == parent) {
        format!("({})", sql)
    } else {
        sql
    }
}

pub fn build_join_default<D: SqlGenerator + ?Sized>(dialect: &D, join: &Join) -> String {
    let keyword = match join.kind {
        JoinKind::Inner => "INNER JOIN",
        JoinKind::Left => "LEFT JOIN",
    };
    let mut sql = format!(
        "{} {} {}",
        join.left.build(dialect),
        keyword,
        join.right.build(dialect)
    );
    if let Some(condition) = &join.condition {
        sql.push(' ');
        sql.push_str(&condition.build(dialect));
    }
    sql
}

/// `SELECT [DISTINCT] cols FROM from [WHERE] [GROUP BY [HAVING]] [ORDER BY] [LIMIT [OFFSET]]`
///
/// An empty select list renders as `*`.
pub fn build_select_default<D: SqlGenerator + ?Sized>(dialect: &D, select: &Select) -> String {
    let mut sql = if select.is_distinct() {
        String::from("SELECT DISTINCT ")
    } else {
        String::from("SELECT ")
    };

    match select.columns() {
        Some(cols) => sql.push_str(&cols.build(dialect)),
        None => sql.push('*'),
    }

    sql.push_str(" FROM ");
    sql.push_str(&select.from().build(dialect));

    if let Some(w) = select.where_clause() {
        sql.push_str(" WHERE ");
        sql.push_str(&w.build(dialect));
    }

    if let Some(g) = select.group_by_clause() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&g.build(dialect));
        if let Some(h) = select.having_clause() {
            sql.push_str(" HAVING ");
            sql.push_str(&h.build(dialect));
        }
    }

    if let Some(o) = select.order_by_clause() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&o.build(dialect));
    }

    sql.push_str(&dialect.build_limit_offset(select.limit_value(), select.offset_value()));
    sql
}

pub fn build_type_default<D: SqlGenerator + ?Sized>(
    dialect: &D,
    column_type: &ColumnType,
) -> SqlResult<String> {
    column_type.validate()?;
    Ok(match column_type {
        ColumnType::Integer { size } => dialect.build_integer(*size),
        ColumnType::VarChar { length } => format!("VARCHAR({})", length),
        ColumnType::Char { length } => format!("CHAR({})", length),
        ColumnType::Numeric { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
        ColumnType::Date => "DATE".to_string(),
        ColumnType::DateTime => "TIMESTAMP".to_string(),
        ColumnType::Time => "TIME".to_string(),
    })
}
