//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: SELECT assembly, operator precedence, placeholders
//! - `dialects`: quoting, booleans and column types per dialect
