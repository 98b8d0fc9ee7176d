use serde_json::{Map, Value};
use std::io;

use super::{flatten_fields, format_cell, record_arrays};

/// Write output as CSV to stdout.
///
/// Sweep points and report rows are written as one record per row; any
/// other result is written as two-column `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            match record_arrays(body).first() {
                Some((_, rows)) => write_array_csv(&mut wtr, rows),
                None => write_fields_csv(&mut wtr, body),
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_cell(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields_csv<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in flatten_fields(map) {
        let _ = wtr.write_record([key.as_str(), &csv_cell(&val)]);
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(csv_cell).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&csv_cell(item)]);
        }
    }
}

/// Empty cell for not-applicable values.
fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => format_cell(other),
    }
}
