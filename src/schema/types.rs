//! Column types and table metadata.

use crate::ast::{ColumnName, Literal, TableName, Value};
use crate::error::{EntityKind, SqlError, SqlResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::str::FromStr;

/// Integer storage width, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Size {
    Tiny,
    Small,
    Medium,
    Normal,
    Big,
}

impl Size {
    /// Size for a storage width in bytes (1, 2, 3, 4 or 8).
    pub fn from_bytes(bytes: u8) -> SqlResult<Size> {
        match bytes {
            1 => Ok(Size::Tiny),
            2 => Ok(Size::Small),
            3 => Ok(Size::Medium),
            4 => Ok(Size::Normal),
            8 => Ok(Size::Big),
            other => Err(SqlError::illegal("integer size", other)),
        }
    }

    pub fn bytes(&self) -> u8 {
        match self {
            Size::Tiny => 1,
            Size::Small => 2,
            Size::Medium => 3,
            Size::Normal => 4,
            Size::Big => 8,
        }
    }

    /// Inclusive range of signed values this size can store.
    pub fn range(&self) -> (i64, i64) {
        match self {
            Size::Tiny => (i8::MIN as i64, i8::MAX as i64),
            Size::Small => (i16::MIN as i64, i16::MAX as i64),
            Size::Medium => (-(1 << 23), (1 << 23) - 1),
            Size::Normal => (i32::MIN as i64, i32::MAX as i64),
            Size::Big => (i64::MIN, i64::MAX),
        }
    }
}

impl FromStr for Size {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" => Ok(Size::Tiny),
            "small" => Ok(Size::Small),
            "medium" => Ok(Size::Medium),
            "normal" => Ok(Size::Normal),
            "big" => Ok(Size::Big),
            _ => Err(SqlError::illegal("integer size", s)),
        }
    }
}

/// Column types understood by every dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer { size: Size },
    VarChar { length: u32 },
    Char { length: u32 },
    Numeric { precision: u8, scale: u8 },
    Date,
    DateTime,
    Time,
}

impl ColumnType {
    pub fn integer(size: Size) -> Self {
        ColumnType::Integer { size }
    }

    pub fn varchar(length: u32) -> SqlResult<Self> {
        let t = ColumnType::VarChar { length };
        t.validate()?;
        Ok(t)
    }

    /// `NUMERIC(precision, scale)`; the scale may not exceed the precision.
    pub fn numeric(precision: u8, scale: u8) -> SqlResult<Self> {
        let t = ColumnType::Numeric { precision, scale };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> SqlResult<()> {
        match self {
            ColumnType::VarChar { length } | ColumnType::Char { length } if *length == 0 => {
                Err(SqlError::illegal("string column length", length))
            }
            ColumnType::Numeric { precision, .. } if *precision == 0 => {
                Err(SqlError::illegal("numeric precision", precision))
            }
            ColumnType::Numeric { precision, scale } if scale > precision => Err(
                SqlError::illegal("numeric scale", format!("{} exceeds precision {}", scale, precision)),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub default_value: Option<Value>,
    pub allows_null: bool,
}

impl Column {
    /// A nullable column without a default.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            default_value: None,
            allows_null: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.allows_null = false;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Build a literal for this column, checking the value fits its type.
    pub fn literal(&self, value: impl Into<Value>) -> SqlResult<Literal> {
        let value = value.into();
        self.check_value(&value)?;
        Ok(Literal::new(value))
    }

    fn check_value(&self, value: &Value) -> SqlResult<()> {
        self.column_type.validate()?;
        let context = format!("column '{}'", self.name);
        match (&self.column_type, value) {
            (_, Value::Null) if self.allows_null => Ok(()),
            (_, Value::Null) => Err(SqlError::illegal(context, "NULL in NOT NULL column")),
            (ColumnType::Integer { size }, Value::Int(n)) => {
                let (lo, hi) = size.range();
                if (lo..=hi).contains(n) {
                    Ok(())
                } else {
                    Err(SqlError::illegal(context, n))
                }
            }
            (ColumnType::Integer { .. }, Value::Bool(_)) => Ok(()),
            (ColumnType::VarChar { length } | ColumnType::Char { length }, Value::String(s)) => {
                if s.chars().count() <= *length as usize {
                    Ok(())
                } else {
                    Err(SqlError::illegal(
                        context,
                        format!("{} characters exceed length {}", s.chars().count(), length),
                    ))
                }
            }
            (ColumnType::Numeric { precision, scale }, Value::Int(_) | Value::Float(_)) => {
                let whole = match value {
                    Value::Int(n) => n.unsigned_abs(),
                    Value::Float(f) if f.is_finite() => f.abs().trunc() as u64,
                    _ => return Err(SqlError::illegal(context, value)),
                };
                let digits = whole.checked_ilog10().map_or(1, |d| d + 1);
                if digits <= u32::from(precision - scale) || whole == 0 {
                    Ok(())
                } else {
                    Err(SqlError::illegal(
                        context,
                        format!("{} does not fit NUMERIC({}, {})", value, precision, scale),
                    ))
                }
            }
            (ColumnType::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|e| SqlError::illegal(context, format!("'{}': {}", s, e))),
            (ColumnType::DateTime, Value::String(s)) => {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                    .map(|_| ())
                    .map_err(|e| SqlError::illegal(context, format!("'{}': {}", s, e)))
            }
            (ColumnType::Time, Value::String(s)) => NaiveTime::parse_from_str(s, "%H:%M:%S")
                .map(|_| ())
                .map_err(|e| SqlError::illegal(context, format!("'{}': {}", s, e))),
            (_, other) => Err(SqlError::illegal(
                context,
                format!("{} value for {:?}", other.kind(), self.column_type),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> SqlResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SqlError::no_such(EntityKind::Column, format!("{}.{}", self.name, name)))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Column reference qualified by this table's name.
    pub fn column_name(&self, name: &str) -> SqlResult<ColumnName> {
        let column = self.column(name)?;
        Ok(ColumnName::qualified(&self.name, &column.name))
    }
}

impl From<&Table> for TableName {
    fn from(table: &Table) -> Self {
        TableName::new(&table.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_ordering() {
        assert!(Size::Tiny < Size::Small);
        assert!(Size::Medium < Size::Normal);
        assert!(Size::Normal < Size::Big);
    }

    #[test]
    fn test_size_from_bytes() {
        assert_eq!(Size::from_bytes(3).unwrap(), Size::Medium);
        assert_eq!(Size::from_bytes(8).unwrap(), Size::Big);
        assert!(matches!(Size::from_bytes(5), Err(SqlError::IllegalValue { .. })));
        assert!(matches!("huge".parse::<Size>(), Err(SqlError::IllegalValue { .. })));
        assert_eq!("TINY".parse::<Size>().unwrap(), Size::Tiny);
    }

    #[test]
    fn test_numeric_scale_exceeds_precision() {
        assert!(ColumnType::numeric(10, 2).is_ok());
        assert!(ColumnType::numeric(4, 4).is_ok());
        let err = ColumnType::numeric(2, 5).unwrap_err();
        assert!(matches!(err, SqlError::IllegalValue { .. }));
        assert!(ColumnType::numeric(0, 0).is_err());
        assert!(ColumnType::varchar(0).is_err());
    }

    #[test]
    fn test_literal_null_handling() {
        let nullable = Column::new("note", ColumnType::varchar(10).unwrap());
        assert!(nullable.literal(Value::Null).is_ok());

        let required = nullable.clone().not_null();
        assert!(matches!(
            required.literal(Value::Null),
            Err(SqlError::IllegalValue { .. })
        ));
    }

    #[test]
    fn test_literal_integer_range() {
        let tiny = Column::new("level", ColumnType::integer(Size::Tiny));
        assert!(tiny.literal(127).is_ok());
        assert!(tiny.literal(128).is_err());
        assert!(tiny.literal("7").is_err());
    }

    #[test]
    fn test_literal_string_length() {
        let code = Column::new("code", ColumnType::Char { length: 3 });
        assert!(code.literal("abc").is_ok());
        assert!(code.literal("abcd").is_err());
    }

    #[test]
    fn test_literal_numeric_digits() {
        let price = Column::new("price", ColumnType::numeric(5, 2).unwrap());
        assert!(price.literal(999.99).is_ok());
        assert!(price.literal(0.5).is_ok());
        assert!(price.literal(1000).is_err());
    }

    #[test]
    fn test_literal_rejects_malformed_type() {
        let broken = Column::new("p", ColumnType::Numeric { precision: 2, scale: 5 });
        let err = broken.literal(1).unwrap_err();
        assert!(matches!(err, SqlError::IllegalValue { .. }));

        let empty = Column::new("code", ColumnType::VarChar { length: 0 });
        assert!(matches!(empty.literal("").unwrap_err(), SqlError::IllegalValue { .. }));
    }

    #[test]
    fn test_literal_temporal() {
        let day = Column::new("day", ColumnType::Date);
        assert!(day.literal("2024-02-29").is_ok());
        assert!(day.literal("2023-02-29").is_err());
        assert!(day.literal(NaiveDate::from_ymd_opt(2024, 1, 1)).is_ok());

        let at = Column::new("at", ColumnType::DateTime);
        assert!(at.literal("2024-01-01 10:00:00").is_ok());
        assert!(at.literal("2024-01-01T10:00:00").is_ok());
        assert!(at.literal("noon").is_err());

        let time = Column::new("t", ColumnType::Time);
        assert!(time.literal("23:59:59").is_ok());
        assert!(time.literal("24:61:00").is_err());
    }

    #[test]
    fn test_table_column_lookup() {
        let users = Table::new(
            "users",
            vec![Column::new("id", ColumnType::integer(Size::Big)).not_null()],
        );
        assert_eq!(
            users.column_name("id").unwrap(),
            ColumnName::qualified("users", "id")
        );
        let err = users.column("email").unwrap_err();
        assert!(matches!(
            err,
            SqlError::NoSuchEntity { kind: EntityKind::Column, ref name } if name == "users.email"
        ));
    }
}
