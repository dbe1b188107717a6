use crate::ast::joins::TableName;
use crate::ast::operators::{
    BinaryOp, ChainOp, LEAF_PRECEDENCE, Operator, OrderDirection, PostfixOp, PrefixOp,
};
use crate::ast::values::Value;
use crate::error::{SqlError, SqlResult};
use crate::transpiler::SqlGenerator;

/// A column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnName {
    pub name: String,
    pub table: Option<String>,
}

impl ColumnName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: Some(table.into()),
        }
    }
}

/// A literal value.
///
/// Once attached to a query the literal remembers the placeholder token it
/// was assigned and renders that token instead of its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Literal {
    pub value: Value,
    placeholder: Option<String>,
}

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            placeholder: None,
        }
    }

    pub fn null() -> Self {
        Self::default()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub(crate) fn set_placeholder(&mut self, token: String) {
        self.placeholder = Some(token);
    }
}

/// SQL function call, e.g. `COUNT(*)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<Expression>,
}

impl Function {
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = Expression>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }
}

/// Composite `left op right` node, parameterized by its operator tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Infix<O> {
    pub left: Box<Expression>,
    pub op: O,
    pub right: Box<Expression>,
}

impl<O: Operator> Infix<O> {
    pub fn new(left: impl Into<Expression>, op: O, right: impl Into<Expression>) -> Self {
        Self {
            left: Box::new(left.into()),
            op,
            right: Box::new(right.into()),
        }
    }
}

impl Infix<ChainOp> {
    /// Append `expr` to the sequence by wrapping the current right operand:
    /// `right` becomes `right op expr`.
    pub fn add_to_sequence(&mut self, expr: impl Into<Expression>) {
        let previous = std::mem::take(self.right.as_mut());
        *self.right = Expression::Chain(Infix::new(previous, self.op, expr));
    }

    /// Append several operands in one mutation. The operands are first folded
    /// into a local chain which then becomes the new right-hand tail.
    pub fn add_many_to_sequence(&mut self, exprs: impl IntoIterator<Item = Expression>) {
        let mut rev = exprs.into_iter().collect::<Vec<_>>().into_iter().rev();
        let Some(last) = rev.next() else {
            return;
        };
        let op = self.op;
        let tail = rev.fold(last, |acc, e| Expression::Chain(Infix::new(e, op, acc)));
        self.add_to_sequence(tail);
    }

    /// Flatten the chain into its operands, in order.
    ///
    /// Only nodes of the same chain operator are unwrapped; anything else,
    /// including a chain of a different operator, is an opaque operand.
    pub fn to_array(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        self.collect_operands(&mut out);
        out
    }

    pub fn into_array(self) -> Vec<Expression> {
        let op = self.op;
        let mut out = Vec::new();
        for side in [*self.left, *self.right] {
            match side {
                Expression::Chain(inner) if inner.op == op => out.extend(inner.into_array()),
                other => out.push(other),
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.to_array().len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    fn collect_operands<'a>(&'a self, out: &mut Vec<&'a Expression>) {
        for side in [self.left.as_ref(), self.right.as_ref()] {
            match side {
                Expression::Chain(inner) if inner.op == self.op => inner.collect_operands(out),
                other => out.push(other),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prefix {
    pub op: PrefixOp,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Postfix {
    pub left: Box<Expression>,
    pub op: PostfixOp,
}

/// A node of the SQL expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `*`, or `t.*` when qualified
    AllColumns(Option<String>),
    Column(ColumnName),
    Literal(Literal),
    Table(TableName),
    Function(Function),
    /// AND / OR / comma sequence
    Chain(Infix<ChainOp>),
    /// Comparison or alias
    Binary(Infix<BinaryOp>),
    Prefix(Prefix),
    Postfix(Postfix),
}

impl Default for Expression {
    fn default() -> Self {
        Expression::Literal(Literal::null())
    }
}

impl Expression {
    /// Render this node through the given dialect.
    pub fn build<D: SqlGenerator + ?Sized>(&self, dialect: &D) -> String {
        match self {
            Expression::AllColumns(table) => dialect.build_all_columns(table.as_deref()),
            Expression::Column(c) => dialect.build_column_name(c),
            Expression::Literal(l) => dialect.build_literal(l),
            Expression::Table(t) => dialect.build_table_name(t),
            Expression::Function(f) => dialect.build_function(f),
            Expression::Chain(i) => dialect.build_chain(i),
            Expression::Binary(i) => dialect.build_binary(i),
            Expression::Prefix(p) => dialect.build_prefix(p),
            Expression::Postfix(p) => dialect.build_postfix(p),
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            Expression::Chain(i) => i.op.precedence(),
            Expression::Binary(i) => i.op.precedence(),
            Expression::Prefix(p) => p.op.precedence(),
            Expression::Postfix(p) => p.op.precedence(),
            _ => LEAF_PRECEDENCE,
        }
    }

    /// Visit every node of the tree, parents before children.
    pub fn walk<'a, F: FnMut(&'a Expression)>(&'a self, visit: &mut F) {
        visit(self);
        match self {
            Expression::Function(f) => f.args.iter().for_each(|arg| arg.walk(visit)),
            Expression::Chain(i) => {
                i.left.walk(visit);
                i.right.walk(visit);
            }
            Expression::Binary(i) => {
                i.left.walk(visit);
                i.right.walk(visit);
            }
            Expression::Prefix(p) => p.right.walk(visit),
            Expression::Postfix(p) => p.left.walk(visit),
            Expression::AllColumns(_)
            | Expression::Column(_)
            | Expression::Literal(_)
            | Expression::Table(_) => {}
        }
    }

    /// Placeholder tokens of the attached literals, in render order.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            if let Expression::Literal(l) = node {
                out.extend(l.placeholder());
            }
        });
        out
    }

    /// Copy of the tree with every literal detached from its placeholder.
    pub fn without_placeholders(&self) -> Expression {
        let mut copy = self.clone();
        copy.detach_literals();
        copy
    }

    fn detach_literals(&mut self) {
        match self {
            Expression::Literal(l) => l.placeholder = None,
            Expression::Function(f) => f.args.iter_mut().for_each(Expression::detach_literals),
            Expression::Chain(i) => {
                i.left.detach_literals();
                i.right.detach_literals();
            }
            Expression::Binary(i) => {
                i.left.detach_literals();
                i.right.detach_literals();
            }
            Expression::Prefix(p) => p.right.detach_literals(),
            Expression::Postfix(p) => p.left.detach_literals(),
            Expression::AllColumns(_) | Expression::Column(_) | Expression::Table(_) => {}
        }
    }

    /// Operands of a chain, or the expression itself.
    pub fn to_array(&self) -> Vec<&Expression> {
        match self {
            Expression::Chain(i) => i.to_array(),
            other => vec![other],
        }
    }

    pub fn into_array(self) -> Vec<Expression> {
        match self {
            Expression::Chain(i) => i.into_array(),
            other => vec![other],
        }
    }

    pub fn is_aliased(&self) -> bool {
        matches!(self, Expression::Binary(Infix { op: BinaryOp::Alias, .. }))
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, Expression::Postfix(p) if p.op.is_order())
    }

    /// Alias name when this is an `expr AS alias` node.
    pub fn alias_name(&self) -> Option<&str> {
        match self {
            Expression::Binary(Infix {
                op: BinaryOp::Alias,
                right,
                ..
            }) => match right.as_ref() {
                Expression::Column(c) => Some(&c.name),
                _ => None,
            },
            _ => None,
        }
    }

    /// `self AS alias`. An expression can only be aliased once.
    pub fn alias(self, alias: impl Into<String>) -> SqlResult<Expression> {
        if self.is_aliased() {
            return Err(SqlError::InvalidChainTarget {
                message: format!("expression is already aliased as '{}'", self.alias_name().unwrap_or_default()),
            });
        }
        Ok(Expression::Binary(Infix::new(
            self,
            BinaryOp::Alias,
            ColumnName::new(alias),
        )))
    }

    /// Wrap in an ORDER BY direction. An ORDER BY node cannot be ordered again.
    pub fn order(self, direction: OrderDirection) -> SqlResult<Expression> {
        if self.is_ordered() {
            return Err(SqlError::InvalidChainTarget {
                message: "expression already carries an ORDER BY direction".to_string(),
            });
        }
        Ok(Expression::Postfix(Postfix {
            left: Box::new(self),
            op: direction.into(),
        }))
    }

    /// Append `other` with a chainable operator, extending an existing chain
    /// of the same operator instead of nesting a new one.
    pub fn chain(self, op: ChainOp, other: impl Into<Expression>) -> Expression {
        match self {
            Expression::Chain(mut infix) if infix.op == op => {
                infix.add_to_sequence(other);
                Expression::Chain(infix)
            }
            left => Expression::Chain(Infix::new(left, op, other)),
        }
    }

    pub fn and(self, other: impl Into<Expression>) -> Expression {
        self.chain(ChainOp::And, other)
    }

    pub fn or(self, other: impl Into<Expression>) -> Expression {
        self.chain(ChainOp::Or, other)
    }

    pub fn compare(self, op: BinaryOp, other: impl Into<Expression>) -> Expression {
        Expression::Binary(Infix::new(self, op, other))
    }

    pub fn equals(self, other: impl Into<Expression>) -> Expression {
        self.compare(BinaryOp::Equals, other)
    }

    pub fn not_equals(self, other: impl Into<Expression>) -> Expression {
        self.compare(BinaryOp::NotEquals, other)
    }

    pub fn lt(self, other: impl Into<Expression>) -> Expression {
        self.compare(BinaryOp::Less, other)
    }

    pub fn le(self, other: impl Into<Expression>) -> Expression {
        self.compare(BinaryOp::LessOrEqual, other)
    }

    pub fn gt(self, other: impl Into<Expression>) -> Expression {
        self.compare(BinaryOp::Greater, other)
    }

    pub fn ge(self, other: impl Into<Expression>) -> Expression {
        self.compare(BinaryOp::GreaterOrEqual, other)
    }

    pub fn like(self, other: impl Into<Expression>) -> Expression {
        self.compare(BinaryOp::Like, other)
    }

    pub fn is_null(self) -> Expression {
        Expression::Postfix(Postfix {
            left: Box::new(self),
            op: PostfixOp::IsNull,
        })
    }

    pub fn is_not_null(self) -> Expression {
        Expression::Postfix(Postfix {
            left: Box::new(self),
            op: PostfixOp::IsNotNull,
        })
    }

    pub fn not(self) -> Expression {
        Expression::Prefix(Prefix {
            op: PrefixOp::Not,
            right: Box::new(self),
        })
    }

    pub fn neg(self) -> Expression {
        Expression::Prefix(Prefix {
            op: PrefixOp::Negate,
            right: Box::new(self),
        })
    }
}

impl From<ColumnName> for Expression {
    fn from(c: ColumnName) -> Self {
        Expression::Column(c)
    }
}

impl From<Literal> for Expression {
    fn from(l: Literal) -> Self {
        Expression::Literal(l)
    }
}

impl From<Value> for Expression {
    fn from(v: Value) -> Self {
        Expression::Literal(Literal::new(v))
    }
}

impl From<TableName> for Expression {
    fn from(t: TableName) -> Self {
        Expression::Table(t)
    }
}

impl From<Function> for Expression {
    fn from(f: Function) -> Self {
        Expression::Function(f)
    }
}

impl From<Infix<ChainOp>> for Expression {
    fn from(i: Infix<ChainOp>) -> Self {
        Expression::Chain(i)
    }
}

impl From<Infix<BinaryOp>> for Expression {
    fn from(i: Infix<BinaryOp>) -> Self {
        Expression::Binary(i)
    }
}

macro_rules! literal_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expression {
                fn from(v: $t) -> Self {
                    Expression::Literal(Literal::new(v))
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Expression {
        ColumnName::new(name).into()
    }

    fn names(exprs: &[&Expression]) -> Vec<String> {
        exprs
            .iter()
            .map(|e| match e {
                Expression::Column(c) => c.name.clone(),
                other => format!("{:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_add_to_sequence_wraps_right() {
        let mut chain = Infix::new(col("a"), ChainOp::And, col("b"));
        chain.add_to_sequence(col("c"));

        assert_eq!(*chain.left, col("a"));
        match chain.right.as_ref() {
            Expression::Chain(inner) => {
                assert_eq!(*inner.left, col("b"));
                assert_eq!(*inner.right, col("c"));
            }
            other => panic!("expected chain, got {:?}", other),
        }
    }

    #[test]
    fn test_to_array_preserves_order() {
        let mut chain = Infix::new(col("e1"), ChainOp::And, col("e2"));
        for i in 3..=7 {
            chain.add_to_sequence(col(&format!("e{}", i)));
        }
        let flat = chain.to_array();
        assert_eq!(flat.len(), 7);
        assert_eq!(names(&flat), (1..=7).map(|i| format!("e{}", i)).collect::<Vec<_>>());
    }

    #[test]
    fn test_add_many_matches_one_at_a_time() {
        let mut many = Infix::new(col("a"), ChainOp::Or, col("b"));
        many.add_many_to_sequence(vec![col("c"), col("d"), col("e")]);

        let mut single = Infix::new(col("a"), ChainOp::Or, col("b"));
        for n in ["c", "d", "e"] {
            single.add_to_sequence(col(n));
        }

        assert_eq!(names(&many.to_array()), names(&single.to_array()));
        assert_eq!(many.len(), 5);
    }

    #[test]
    fn test_add_many_empty_is_noop() {
        let mut chain = Infix::new(col("a"), ChainOp::Comma, col("b"));
        let before = chain.clone();
        chain.add_many_to_sequence(Vec::new());
        assert_eq!(chain, before);
    }

    #[test]
    fn test_flatten_stops_at_type_boundary() {
        let eq = col("x").equals(1);
        let inner_or = col("p").or(col("q"));
        let chain = col("a").and(eq.clone()).and(inner_or.clone());

        let flat = chain.to_array();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[1], &eq);
        assert_eq!(flat[2], &inner_or);
    }

    #[test]
    fn test_into_array_owned() {
        let chain = col("a").and(col("b")).and(col("c"));
        let owned = chain.into_array();
        assert_eq!(owned, vec![col("a"), col("b"), col("c")]);
    }

    #[test]
    fn test_alias_twice_is_rejected() {
        let aliased = col("a").alias("x").unwrap();
        assert!(aliased.is_aliased());
        assert_eq!(aliased.alias_name(), Some("x"));
        let err = aliased.alias("y").unwrap_err();
        assert!(matches!(err, SqlError::InvalidChainTarget { .. }));
    }

    #[test]
    fn test_reorder_is_rejected() {
        let ordered = col("a").order(OrderDirection::Desc).unwrap();
        let err = ordered.order(OrderDirection::Asc).unwrap_err();
        assert!(matches!(err, SqlError::InvalidChainTarget { .. }));
    }
}
