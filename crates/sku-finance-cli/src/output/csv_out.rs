use serde_json::Value;
use std::io;

use super::{flatten_value, is_row_array, scalar_text};

/// Result fields written as the CSV body, first match wins.
const PRIMARY_ROWS: [&str; 5] = ["results", "pnl", "trials", "metrics", "matrix"];

/// Write output as CSV to stdout: the primary row table of the result when
/// there is one, otherwise a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let primary = result
        .as_object()
        .and_then(|m| PRIMARY_ROWS.iter().find_map(|k| m.get(*k)))
        .and_then(Value::as_array);

    match (result, primary) {
        (_, Some(rows)) => write_rows(&mut wtr, rows),
        (Value::Array(rows), None) => write_rows(&mut wtr, rows),
        (other, None) => {
            let mut fields = Vec::new();
            flatten_value("", other, &mut fields);
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in fields {
                let _ = wtr.write_record([key, val]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    if !is_row_array(&Value::Array(rows.to_vec())) {
        // Matrix or plain list: one record per element
        for row in rows {
            let record: Vec<String> = match row {
                Value::Array(cells) => cells.iter().map(scalar_text).collect(),
                other => vec![scalar_text(other)],
            };
            let _ = wtr.write_record(&record);
        }
        return;
    }

    let flattened: Vec<Vec<(String, String)>> = rows
        .iter()
        .map(|row| {
            let mut cells = Vec::new();
            flatten_value("", row, &mut cells);
            cells
        })
        .collect();

    let headers: Vec<String> = flattened[0].iter().map(|(k, _)| k.clone()).collect();
    let _ = wtr.write_record(&headers);
    for cells in &flattened {
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
        let _ = wtr.write_record(&record);
    }
}
