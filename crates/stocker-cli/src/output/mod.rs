pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod report;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
        OutputFormat::Report => report::print_report(value),
    }
}

/// Flatten nested objects into `(dotted.key, value)` pairs. Arrays are kept
/// as leaves.
pub(crate) fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(&path, inner, out),
            _ => out.push((path, val.clone())),
        }
    }
}

/// Look up a dotted path such as `summary.goal.likelihood_pct`.
pub(crate) fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

/// True for a non-empty array whose items are all objects.
pub(crate) fn is_record_array(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested() {
        let v = json!({"a": 1, "b": {"c": 2, "d": {"e": 3}}, "f": [1, 2]});
        let mut out = Vec::new();
        flatten("", v.as_object().unwrap(), &mut out);
        let keys: Vec<&str> = out.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b.c", "b.d.e", "f"]);
    }

    #[test]
    fn test_lookup_path() {
        let v = json!({"summary": {"goal": {"likelihood_pct": 62.5}}});
        assert_eq!(lookup(&v, "summary.goal.likelihood_pct"), Some(&json!(62.5)));
        assert_eq!(lookup(&v, "summary.missing"), None);
    }

    #[test]
    fn test_record_array() {
        assert!(is_record_array(&json!([{"a": 1}])));
        assert!(!is_record_array(&json!([1, 2])));
        assert!(!is_record_array(&json!([])));
    }
}
