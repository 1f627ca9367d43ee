use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Columns shown for well-known row types; other arrays show every key of
/// their first row.
const COLUMNS: &[(&str, &[&str])] = &[
    ("pillars", &["pillar", "score", "level"]),
    ("benchmarks", &["metric", "value", "unit", "level", "percentile", "distance_label"]),
    ("alerts", &["severity", "title", "impact", "action"]),
    ("penalties", &["reason", "points", "compound"]),
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(None, map);
            }
        }
        Value::Array(arr) => print_array_table(None, arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(None, res_map),
        Value::Array(arr) => print_array_table(None, arr),
        other => println!("{}", format_value(other)),
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

/// Scalars and nested objects go into one Field/Value table; arrays of
/// objects are printed after it as their own tables.
fn print_object(heading: Option<&str>, map: &Map<String, Value>) {
    let mut rows: Vec<(String, String)> = Vec::new();
    let mut nested: Vec<(&str, &Vec<Value>)> = Vec::new();
    flatten(None, map, &mut rows, &mut nested);

    if let Some(h) = heading {
        println!("\n{}:", h);
    }
    if !rows.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &rows {
            builder.push_record([key.as_str(), val.as_str()]);
        }
        println!("{}", Table::from(builder));
    }
    for (key, arr) in nested {
        print_array_table(Some(key), arr);
    }
}

fn flatten<'a>(
    prefix: Option<&str>,
    map: &'a Map<String, Value>,
    rows: &mut Vec<(String, String)>,
    nested: &mut Vec<(&'a str, &'a Vec<Value>)>,
) {
    for (key, val) in map {
        let name = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key.clone(),
        };
        match val {
            Value::Object(inner) => flatten(Some(&name), inner, rows, nested),
            Value::Array(arr) if arr.iter().any(Value::is_object) => nested.push((key.as_str(), arr)),
            // The summary reads better outside the grid.
            Value::String(s) if s.contains('\n') => {
                println!("{}", s);
                println!();
            }
            _ => rows.push((name, format_value(val))),
        }
    }
}

fn print_array_table(heading: Option<&str>, arr: &[Value]) {
    if let Some(h) = heading {
        println!("\n{}:", h);
    }
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = match COLUMNS.iter().find(|(name, _)| Some(*name) == heading) {
            Some((_, cols)) => cols.iter().map(|c| c.to_string()).collect(),
            None => first.keys().cloned().collect(),
        };
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
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
