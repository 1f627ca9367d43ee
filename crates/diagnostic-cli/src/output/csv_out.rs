use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// Object results become `field,value` rows with dotted paths for nested
/// fields; array elements are addressed by index (`alerts.0.title`).
/// Top-level arrays (threshold listings) are written as one row per entry.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in flatten(body) {
                let _ = wtr.write_record([key.as_str(), val.as_str()]);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn flatten(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    for (key, val) in map {
        push_rows(key.clone(), val, &mut rows);
    }
    rows
}

fn push_rows(path: String, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(inner) => {
            for (key, val) in inner {
                push_rows(format!("{}.{}", path, key), val, rows);
            }
        }
        Value::Array(items) if items.iter().any(|v| v.is_object() || v.is_array()) => {
            for (i, item) in items.iter().enumerate() {
                push_rows(format!("{}.{}", path, i), item, rows);
            }
        }
        _ => rows.push((path, format_csv_value(value))),
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
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(format_csv_value)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_paths() {
        let v = json!({
            "score": {"total": null, "pillars": [{"pillar": "risk", "score": "14"}]},
            "missing": ["dso", "margin"]
        });
        let rows = flatten(v.as_object().unwrap());
        assert!(rows.contains(&("score.total".to_string(), String::new())));
        assert!(rows.contains(&("score.pillars.0.score".to_string(), "14".to_string())));
        assert!(rows.contains(&("missing".to_string(), "dso; margin".to_string())));
    }

    #[test]
    fn test_array_rows() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_array_csv(
            &mut wtr,
            &[json!({"metric": "dso", "median": "45"}), json!({"metric": "margin", "median": "6"})],
        );
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        // serde_json maps are key-ordered
        assert_eq!(out, "median,metric\n45,dso\n6,margin\n");
    }
}
