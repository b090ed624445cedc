pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A non-empty array of objects, printed as its own table.
pub(crate) fn is_row_array(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if matches!(arr.first(), Some(Value::Object(_))))
}

/// Flatten nested objects into dotted `(key, text)` pairs. Arrays of rows
/// collapse to a row count; arrays of scalars are joined.
pub(crate) fn flatten_value(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_value(&name, inner, out);
            }
        }
        Value::Array(arr) if is_row_array(value) => {
            out.push((prefix.to_string(), format!("[{} rows]", arr.len())));
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(scalar_text).collect();
            out.push((prefix.to_string(), items.join(", ")));
        }
        _ => out.push((prefix.to_string(), scalar_text(value))),
    }
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
