pub mod builders;
pub mod expr;
pub mod joins;
pub mod operators;
pub mod values;

pub use self::expr::{ColumnName, Expression, Function, Infix, Literal, Postfix, Prefix};
pub use self::joins::{Join, JoinCondition, TableId, TableName, TableReference};
pub use self::operators::{
    BinaryOp, ChainOp, JoinKind, Operator, OrderDirection, PostfixOp, PrefixOp,
};
pub use self::values::Value;
