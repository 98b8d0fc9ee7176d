use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_fields, format_cell, record_arrays};

/// Format output as tables using the tabled crate.
///
/// Scalar and nested fields go into one Field/Value table; every array of
/// records (sweep points, report rows) gets a table of its own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                print_map(result);
                print_envelope_notes(map);
            } else {
                print_map(map);
                if let Some(Value::String(text)) = map.get("summary_text") {
                    println!("\n{}", text);
                }
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_map(map: &Map<String, Value>) {
    let fields: Vec<(String, Value)> = flatten_fields(map)
        .into_iter()
        .filter(|(k, _)| k != "summary_text")
        .collect();
    if !fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &fields {
            builder.push_record([key.as_str(), &format_cell(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (name, rows) in record_arrays(map) {
        println!("\n{}:", title_case(name));
        print_array_table(rows);
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
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

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.iter().map(|h| title_case(h)));

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_cell(item));
        }
    }
}

/// `cln_impact` -> `Cln Impact`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("cln_impact"), "Cln Impact");
        assert_eq!(title_case("total_income"), "Total Income");
        assert_eq!(title_case("points"), "Points");
    }
}
