//! Template variable substitution for copied text files
//!
//! Placeholders use `{{ name }}` syntax. Whitespace inside the braces is
//! ignored. Placeholders naming an unknown variable are left untouched so
//! files that use braces for other purposes survive a copy.

use crate::config::TemplateVariables;
use serde_json::Value;

/// Replace every known `{{ name }}` placeholder in `input`
pub fn render(input: &str, variables: &TemplateVariables) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            output.push_str(&rest[start..]);
            return output;
        };

        let name = after_open[..end].trim();
        match variables.get(name) {
            Some(value) => output.push_str(&display_value(value)),
            None => output.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    output.push_str(rest);
    output
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Whether `input` contains at least one placeholder
pub fn has_placeholders(input: &str) -> bool {
    input
        .find("{{")
        .is_some_and(|start| input[start + 2..].contains("}}"))
}
