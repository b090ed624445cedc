use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_value, is_row_array};

/// Envelope keys that are printed separately or not at all.
const ENVELOPE_KEYS: [&str; 5] = ["result", "warnings", "methodology", "assumptions", "metadata"];

/// Format output as tables: scalar fields first, then one table per row
/// array (P&L, cash flow, sensitivity records, ...).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result(result, map),
            None => print_fields(value),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            let scalars: Map<String, Value> = res_map
                .iter()
                .filter(|(_, v)| !is_row_array(v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if !scalars.is_empty() {
                print_fields(&Value::Object(scalars));
            }
            for (key, val) in res_map {
                if let Value::Array(rows) = val {
                    if is_row_array(val) {
                        println!("\n{key}:");
                        print_rows(rows);
                    }
                }
            }
        }
        Value::Array(rows) => print_rows(rows),
        other => println!("{other}"),
    }

    // Extra sections next to the result, e.g. a tornado ranking
    for (key, val) in envelope {
        if ENVELOPE_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Value::Array(rows) = val {
            println!("\n{key}:");
            print_rows(rows);
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(value: &Value) {
    let mut fields = Vec::new();
    flatten_value("", value, &mut fields);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let rows: Vec<Vec<(String, String)>> = arr
        .iter()
        .map(|item| {
            let mut cells = Vec::new();
            flatten_value("", item, &mut cells);
            cells
        })
        .collect();

    let headers: Vec<String> = rows[0].iter().map(|(k, _)| k.clone()).collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for cells in &rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| {
                cells
                    .iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect();
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}
