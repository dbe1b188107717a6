use crate::ast::expr::{ColumnName, Expression};
use crate::ast::operators::JoinKind;
use crate::transpiler::SqlGenerator;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a table object. Clones share it; separately constructed
/// tables never do, even when their names match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(u64);

impl TableId {
    fn next() -> Self {
        TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A table name with an optional alias.
#[derive(Debug, Clone)]
pub struct TableName {
    pub name: String,
    pub alias: Option<String>,
    id: TableId,
}

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            id: TableId::next(),
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(name).with_alias(alias)
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name the rest of the query uses to refer to this table.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn is_same_table(&self, other: &TableName) -> bool {
        self.id == other.id
    }

    /// Column of this table, qualified by its reference name.
    pub fn column(&self, name: impl Into<String>) -> ColumnName {
        ColumnName::qualified(self.reference_name(), name)
    }
}

impl PartialEq for TableName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.alias == other.alias
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        TableName::new(name)
    }
}

impl From<String> for TableName {
    fn from(name: String) -> Self {
        TableName::new(name)
    }
}

impl From<&TableName> for TableName {
    fn from(table: &TableName) -> Self {
        table.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    On(Expression),
    Using(Vec<ColumnName>),
}

impl JoinCondition {
    pub fn using<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        JoinCondition::Using(columns.into_iter().map(ColumnName::new).collect())
    }

    pub fn build<D: SqlGenerator + ?Sized>(&self, dialect: &D) -> String {
        dialect.build_join_condition(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub left: Box<TableReference>,
    pub right: Box<TableReference>,
    pub condition: Option<JoinCondition>,
}

/// Root of a FROM clause: a table or a (left-growing) join tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TableReference {
    Table(TableName),
    Join(Join),
}

impl TableReference {
    pub fn join(
        left: TableReference,
        kind: JoinKind,
        right: impl Into<TableReference>,
        condition: Option<JoinCondition>,
    ) -> Self {
        TableReference::Join(Join {
            kind,
            left: Box::new(left),
            right: Box::new(right.into()),
            condition,
        })
    }

    pub fn build<D: SqlGenerator + ?Sized>(&self, dialect: &D) -> String {
        match self {
            TableReference::Table(t) => dialect.build_table_name(t),
            TableReference::Join(j) => match j.kind {
                JoinKind::Inner => dialect.build_inner_join(j),
                JoinKind::Left => dialect.build_left_join(j),
            },
        }
    }

    /// Every table in the tree, left to right.
    pub fn tables(&self) -> Vec<&TableName> {
        match self {
            TableReference::Table(t) => vec![t],
            TableReference::Join(j) => {
                let mut out = j.left.tables();
                out.extend(j.right.tables());
                out
            }
        }
    }

    /// `ON` expressions of every join in the tree, innermost first.
    pub fn on_conditions(&self) -> Vec<&Expression> {
        match self {
            TableReference::Table(_) => Vec::new(),
            TableReference::Join(j) => {
                let mut out = j.left.on_conditions();
                out.extend(j.right.on_conditions());
                if let Some(JoinCondition::On(expr)) = &j.condition {
                    out.push(expr);
                }
                out
            }
        }
    }
}

impl From<TableName> for TableReference {
    fn from(t: TableName) -> Self {
        TableReference::Table(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_identity() {
        let a = TableName::new("users");
        let b = TableName::new("users");
        assert_eq!(a, b);
        assert!(!a.is_same_table(&b));
        assert!(a.is_same_table(&a.clone()));
    }

    #[test]
    fn test_reference_name() {
        assert_eq!(TableName::new("users").reference_name(), "users");
        assert_eq!(TableName::aliased("users", "u").reference_name(), "u");
        assert_eq!(
            TableName::aliased("users", "u").column("id"),
            ColumnName::qualified("u", "id")
        );
    }

    #[test]
    fn test_tables_left_to_right() {
        let from = TableReference::join(
            TableReference::join(
                TableName::new("a").into(),
                JoinKind::Inner,
                TableName::new("b"),
                None,
            ),
            JoinKind::Left,
            TableName::new("c"),
            None,
        );
        let names: Vec<_> = from.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
