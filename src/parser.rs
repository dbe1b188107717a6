//! Text parser using nom.
//!
//! Turns the small textual forms accepted on the command line into
//! expression trees.
//!
//! ```text
//! condition    u.age >= 21 AND (u.name LIKE 'a%' OR u.deleted_at IS NULL)
//! select item  COUNT(*) AS total
//! order item   u.name DESC
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, none_of, satisfy},
    combinator::{map, map_res, not, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use crate::ast::builders::{all_columns, all_columns_of, func};
use crate::ast::{BinaryOp, ColumnName, Expression, Literal, OrderDirection, Value};
use crate::error::{SqlError, SqlResult};

/// Parse a WHERE / HAVING / ON condition.
pub fn parse_condition(input: &str) -> SqlResult<Expression> {
    finish(input, parse_or(input.trim()))
}

/// Parse one select-list entry, with an optional `AS alias`.
pub fn parse_select_item(input: &str) -> SqlResult<Expression> {
    let (expr, alias) = finish(input, parse_aliased_item(input.trim()))?;
    match alias {
        Some(alias) => expr.alias(alias),
        None => Ok(expr),
    }
}

/// Parse an ORDER BY entry. The direction defaults to ascending.
pub fn parse_order_item(input: &str) -> SqlResult<(Expression, OrderDirection)> {
    finish(input, parse_ordered_item(input.trim()))
}

fn finish<T>(input: &str, result: IResult<&str, T>) -> SqlResult<T> {
    let trimmed = input.trim();
    let offset = input.len() - input.trim_start().len();
    match result {
        Ok((rest, out)) if rest.trim().is_empty() => Ok(out),
        Ok((rest, _)) => Err(SqlError::parse(
            offset + trimmed.len() - rest.trim_start().len(),
            format!("Unexpected trailing content: '{}'", rest.trim()),
        )),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(SqlError::parse(
            offset + trimmed.len() - e.input.len(),
            format!("Parse failed near '{}'", e.input),
        )),
        Err(nom::Err::Incomplete(_)) => {
            Err(SqlError::parse(input.len(), "Unexpected end of input"))
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive keyword that is not the prefix of a longer identifier.
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(kw), not(satisfy(is_ident_char)))
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(is_ident_char)(input)
}

/// `a OR b OR ...`
fn parse_or(input: &str) -> IResult<&str, Expression> {
    let (input, first) = parse_and(input)?;
    let (input, rest) = many0(preceded(ws(keyword("or")), parse_and))(input)?;
    Ok((input, rest.into_iter().fold(first, |acc, e| acc.or(e))))
}

/// `a AND b AND ...`
fn parse_and(input: &str) -> IResult<&str, Expression> {
    let (input, first) = parse_unary(input)?;
    let (input, rest) = many0(preceded(ws(keyword("and")), parse_unary))(input)?;
    Ok((input, rest.into_iter().fold(first, |acc, e| acc.and(e))))
}

fn parse_unary(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0(input)?;
    alt((
        map(preceded(pair(keyword("not"), multispace0), parse_unary), Expression::not),
        delimited(char('('), ws(parse_or), char(')')),
        parse_comparison,
    ))(input)
}

#[derive(Clone)]
enum Comparison {
    IsNull,
    IsNotNull,
    Binary(BinaryOp, Expression),
}

fn parse_comparison(input: &str) -> IResult<&str, Expression> {
    let (input, left) = parse_operand(input)?;
    let (input, _) = multispace0(input)?;
    let (input, tail) = alt((
        value(
            Comparison::IsNotNull,
            tuple((keyword("is"), multispace1, keyword("not"), multispace1, keyword("null"))),
        ),
        value(
            Comparison::IsNull,
            tuple((keyword("is"), multispace1, keyword("null"))),
        ),
        map(pair(ws(parse_comparison_op), parse_operand), |(op, right)| {
            Comparison::Binary(op, right)
        }),
    ))(input)?;
    let expr = match tail {
        Comparison::IsNull => left.is_null(),
        Comparison::IsNotNull => left.is_not_null(),
        Comparison::Binary(op, right) => left.compare(op, right),
    };
    Ok((input, expr))
}

fn parse_comparison_op(input: &str) -> IResult<&str, BinaryOp> {
    map_res(
        alt((
            tag(">="),
            tag("<="),
            tag("<>"),
            tag("!="),
            tag("="),
            tag("<"),
            tag(">"),
            keyword("like"),
        )),
        |s: &str| s.parse::<BinaryOp>(),
    )(input)
}

/// A literal or a possibly qualified column reference.
fn parse_operand(input: &str) -> IResult<&str, Expression> {
    alt((map(parse_literal, Expression::Literal), parse_column_ref))(input)
}

fn parse_column_ref(input: &str) -> IResult<&str, Expression> {
    let (input, first) = parse_identifier(input)?;
    let (input, second) = opt(preceded(char('.'), parse_identifier))(input)?;
    let column = match second {
        Some(name) => ColumnName::qualified(first, name),
        None => ColumnName::new(first),
    };
    Ok((input, Expression::Column(column)))
}

fn parse_literal(input: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::null(), keyword("null")),
        value(Literal::new(true), keyword("true")),
        value(Literal::new(false), keyword("false")),
        parse_number,
        map(parse_quoted_string, Literal::new),
    ))(input)
}

fn parse_number(input: &str) -> IResult<&str, Literal> {
    let (input, num_str) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;
    let (input, _) = not(satisfy(is_ident_char))(input)?;

    let value = if num_str.contains('.') {
        num_str.parse::<f64>().map(Value::Float).ok()
    } else {
        num_str.parse::<i64>().map(Value::Int).ok()
    };
    match value {
        Some(v) => Ok((input, Literal::new(v))),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// Single-quoted string; `''` stands for one quote.
fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            many0(alt((value('\'', tag("''")), none_of("'")))),
            char('\''),
        ),
        |chars: Vec<char>| chars.into_iter().collect(),
    )(input)
}

/// `*`, `t.*`, `name(args)` or an operand.
fn parse_item(input: &str) -> IResult<&str, Expression> {
    alt((
        value(all_columns(), char('*')),
        map(terminated(parse_identifier, tag(".*")), all_columns_of),
        parse_function,
        parse_operand,
    ))(input)
}

fn parse_function(input: &str) -> IResult<&str, Expression> {
    let (input, name) = parse_identifier(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), parse_item),
        ws(char(')')),
    )(input)?;
    Ok((input, func(name, args)))
}

fn parse_aliased_item(input: &str) -> IResult<&str, (Expression, Option<String>)> {
    let (input, expr) = parse_item(input)?;
    let (input, alias) = opt(preceded(
        tuple((multispace1, keyword("as"), multispace1)),
        parse_identifier,
    ))(input)?;
    Ok((input, (expr, alias.map(str::to_string))))
}

fn parse_ordered_item(input: &str) -> IResult<&str, (Expression, OrderDirection)> {
    let (input, expr) = parse_item(input)?;
    let (input, direction) = opt(preceded(
        multispace1,
        alt((
            value(OrderDirection::Asc, keyword("asc")),
            value(OrderDirection::Desc, keyword("desc")),
        )),
    ))(input)?;
    Ok((input, (expr, direction.unwrap_or(OrderDirection::Asc))))
}
