use crate::transpiler::traits::SqlGenerator;

/// Renders without a backend: identifiers and strings are quoted but not
/// escaped. Output is for logs and diagnostics, not for execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalGenerator;

impl SqlGenerator for CanonicalGenerator {
    fn name(&self) -> &'static str {
        "canonical"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name)
    }

    fn quote_string_literal(&self, value: &str) -> String {
        format!("'{}'", value)
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn bool_literal(&self, val: bool) -> String {
        if val {
            "TRUE".to_string()
        } else {
            "FALSE".to_string()
        }
    }
}
