//! # sqlcompose
//!
//! Compose SQL as expression trees and render them per dialect.
//!
//! Builder calls register every alias and literal they attach in the
//! query's registries; literals render as named placeholders (`:dbph`,
//! `:dbph2`, ...) whose values are returned separately for binding.
//!
//! ```
//! use sqlcompose::prelude::*;
//!
//! let mut select = Select::select_as("users", "u").unwrap();
//! select.add_column(table_col("u", "name")).unwrap();
//! select.and_where(table_col("u", "age").ge(lit(21))).unwrap();
//! select.limit(10);
//!
//! assert_eq!(
//!     select.to_sql_with_dialect(Dialect::MySQL),
//!     "SELECT `u`.`name` FROM `users` AS `u` WHERE `u`.`age` >= :dbph LIMIT 10"
//! );
//! assert_eq!(select.arguments(), vec![(":dbph".to_string(), Value::Int(21))]);
//! ```

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod parser;
pub mod query;
pub mod registry;
pub mod schema;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::builders::*;
    pub use crate::ast::*;
    pub use crate::error::*;
    pub use crate::query::{Query, Select};
    pub use crate::transpiler::{Dialect, SqlGenerator, ToSql};
}
