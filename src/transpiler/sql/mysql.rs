use crate::error::SqlResult;
use crate::schema::{ColumnType, Size};
use crate::transpiler::traits::{SqlGenerator, build_type_default};

/// MySQL Generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlGenerator;

impl MysqlGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for MysqlGenerator {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    // Backslash is an escape character in MySQL string literals.
    fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn bool_literal(&self, val: bool) -> String {
        if val { "1".to_string() } else { "0".to_string() }
    }

    fn build_integer(&self, size: Size) -> String {
        match size {
            Size::Tiny => "TINYINT",
            Size::Small => "SMALLINT",
            Size::Medium => "MEDIUMINT",
            Size::Normal => "INTEGER",
            Size::Big => "BIGINT",
        }
        .to_string()
    }

    fn build_type(&self, column_type: &ColumnType) -> SqlResult<String> {
        match column_type {
            ColumnType::Numeric { precision, scale } => {
                column_type.validate()?;
                Ok(format!("DECIMAL({}, {})", precision, scale))
            }
            ColumnType::DateTime => Ok("DATETIME".to_string()),
            other => build_type_default(self, other),
        }
    }
}
