use serde_json::Value;

use super::scalar_text;

/// Key answer of each command, as JSON pointers into the result, in
/// priority order.
const PRIORITY_POINTERS: [&str; 7] = [
    "/returns/npv",
    "/achieved",
    "/npv",
    "/base_case_value",
    "/probability_weighted/npv",
    "/baseline/npv",
    "/metrics/0/statistics/mean",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for pointer in PRIORITY_POINTERS {
        if let Some(val) = result_obj.pointer(pointer) {
            if !val.is_null() {
                println!("{}", scalar_text(val));
                return;
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, scalar_text(val));
            return;
        }
    }

    println!("{}", scalar_text(result_obj));
}
