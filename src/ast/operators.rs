use crate::error::SqlError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Precedence of leaf nodes; nothing binds tighter.
pub const LEAF_PRECEDENCE: u8 = 10;

/// Operator tag of a composite expression node.
///
/// The symbol and precedence table lives here so that composite nodes stay
/// purely structural.
pub trait Operator: Copy + PartialEq + std::fmt::Debug {
    fn symbol(&self) -> &'static str;
    /// Higher binds tighter.
    fn precedence(&self) -> u8;
}

/// Operators whose repeated operands associate into one flattenable sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainOp {
    And,
    Or,
    /// Comma-separated list (select list, GROUP BY, ORDER BY)
    Comma,
}

impl ChainOp {
    pub fn space_before(&self) -> bool {
        !matches!(self, ChainOp::Comma)
    }
}

impl Operator for ChainOp {
    fn symbol(&self) -> &'static str {
        match self {
            ChainOp::And => "AND",
            ChainOp::Or => "OR",
            ChainOp::Comma => ",",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            ChainOp::Comma => 1,
            ChainOp::Or => 3,
            ChainOp::And => 4,
        }
    }
}

/// One-shot binary operators. These never chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Like,
    /// `expr AS alias`
    Alias,
}

impl Operator for BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Equals => "=",
            BinaryOp::NotEquals => "<>",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Like => "LIKE",
            BinaryOp::Alias => "AS",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Alias => 2,
            _ => 6,
        }
    }
}

impl FromStr for BinaryOp {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "=" => Ok(BinaryOp::Equals),
            "<>" | "!=" => Ok(BinaryOp::NotEquals),
            "<" => Ok(BinaryOp::Less),
            "<=" => Ok(BinaryOp::LessOrEqual),
            ">" => Ok(BinaryOp::Greater),
            ">=" => Ok(BinaryOp::GreaterOrEqual),
            "LIKE" => Ok(BinaryOp::Like),
            _ => Err(SqlError::illegal("comparison operator", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOp {
    Not,
    /// Unary minus
    Negate,
}

impl PrefixOp {
    pub fn space_after(&self) -> bool {
        matches!(self, PrefixOp::Not)
    }
}

impl Operator for PrefixOp {
    fn symbol(&self) -> &'static str {
        match self {
            PrefixOp::Not => "NOT",
            PrefixOp::Negate => "-",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            PrefixOp::Not => 5,
            PrefixOp::Negate => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostfixOp {
    Asc,
    Desc,
    IsNull,
    IsNotNull,
}

impl PostfixOp {
    pub fn is_order(&self) -> bool {
        matches!(self, PostfixOp::Asc | PostfixOp::Desc)
    }
}

impl Operator for PostfixOp {
    fn symbol(&self) -> &'static str {
        match self {
            PostfixOp::Asc => "ASC",
            PostfixOp::Desc => "DESC",
            PostfixOp::IsNull => "IS NULL",
            PostfixOp::IsNotNull => "IS NOT NULL",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            PostfixOp::Asc | PostfixOp::Desc => 2,
            PostfixOp::IsNull | PostfixOp::IsNotNull => 7,
        }
    }
}

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl From<OrderDirection> for PostfixOp {
    fn from(dir: OrderDirection) -> Self {
        match dir {
            OrderDirection::Asc => PostfixOp::Asc,
            OrderDirection::Desc => PostfixOp::Desc,
        }
    }
}

/// Only the exact keywords `ASC` and `DESC` are accepted.
impl FromStr for OrderDirection {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(OrderDirection::Asc),
            "DESC" => Ok(OrderDirection::Desc),
            _ => Err(SqlError::InvalidOrderDirection {
                given: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::Left => write!(f, "LEFT JOIN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_is_exact() {
        assert_eq!("ASC".parse::<OrderDirection>().unwrap(), OrderDirection::Asc);
        assert_eq!("DESC".parse::<OrderDirection>().unwrap(), OrderDirection::Desc);
        for bad in ["asc", "Desc", "UP", " ASC", ""] {
            let err = bad.parse::<OrderDirection>().unwrap_err();
            assert!(matches!(err, SqlError::InvalidOrderDirection { given } if given == bad));
        }
    }

    #[test]
    fn test_precedence_table() {
        assert!(ChainOp::Comma.precedence() < ChainOp::Or.precedence());
        assert!(ChainOp::Or.precedence() < ChainOp::And.precedence());
        assert!(ChainOp::And.precedence() < PrefixOp::Not.precedence());
        assert!(PrefixOp::Not.precedence() < BinaryOp::Equals.precedence());
        assert!(BinaryOp::Equals.precedence() < LEAF_PRECEDENCE);
    }
}
