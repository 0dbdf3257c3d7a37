use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, is_record_array};

/// Format output as tables using the tabled crate.
///
/// Scalar fields of the result go into one Field/Value table; each array of
/// records (year history, histogram bins, presets) gets a table of its own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                print_result_tables(result);
                print_envelope(map);
            } else {
                print_result_tables(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_tables(result: &Map<String, Value>) {
    let mut fields = Vec::new();
    let mut records: Vec<(String, &Vec<Value>)> = Vec::new();
    collect(result, "", &mut fields, &mut records);

    if !fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &fields {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (key, arr) in records {
        println!("\n{}:", key);
        print_array_table(arr);
    }
}

/// Split an object into scalar fields (flattened) and record arrays.
fn collect<'a>(
    map: &'a Map<String, Value>,
    prefix: &str,
    fields: &mut Vec<(String, Value)>,
    records: &mut Vec<(String, &'a Vec<Value>)>,
) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Array(arr) if is_record_array(val) => records.push((path, arr)),
            Value::Object(inner) if inner.values().any(is_record_array) => {
                collect(inner, &path, fields, records)
            }
            Value::Object(inner) => flatten(&path, inner, fields),
            _ => fields.push((path, val.clone())),
        }
    }
}

fn print_envelope(envelope: &Map<String, Value>) {
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
        // Nested lists (per-position returns) stay out of the row tables.
        let headers: Vec<String> = first
            .iter()
            .filter(|(_, v)| !is_record_array(v))
            .map(|(k, _)| k.clone())
            .collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.4}", f)
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_float_trims_zeros() {
        assert_eq!(format_value(&json!(1.5)), "1.5");
        assert_eq!(format_value(&json!(2.123456)), "2.1235");
        assert_eq!(format_value(&json!(400)), "400");
    }

    #[test]
    fn test_collect_splits_records() {
        let v = json!({
            "name": "plan",
            "state": {"status": "completed"},
            "history": [{"year": 1}, {"year": 2}],
            "summary": {"num_trials": 10, "terminal_values": {"mean": 1.0}}
        });
        let mut fields = Vec::new();
        let mut records = Vec::new();
        collect(v.as_object().unwrap(), "", &mut fields, &mut records);
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"state.status"));
        assert!(keys.contains(&"summary.terminal_values.mean"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "history");
    }
}
