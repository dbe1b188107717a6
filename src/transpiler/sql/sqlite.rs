use crate::error::SqlResult;
use crate::schema::{ColumnType, Size};
use crate::transpiler::traits::{SqlGenerator, build_type_default};

/// SQLite Generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGenerator;

impl SqlGenerator for SqliteGenerator {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, id: &str) -> String {
        format!("\"{}\"", id.replace('"', "\"\""))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn bool_literal(&self, val: bool) -> String {
        if val {
            "1".to_string()
        } else {
            "0".to_string()
        }
    }

    /// SQLite has a single integer storage class.
    fn build_integer(&self, _size: Size) -> String {
        "INTEGER".to_string()
    }

    fn build_type(&self, column_type: &ColumnType) -> SqlResult<String> {
        match column_type {
            ColumnType::DateTime => Ok("DATETIME".to_string()),
            other => build_type_default(self, other),
        }
    }
}
