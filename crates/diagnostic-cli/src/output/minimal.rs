use serde_json::Value;

/// Print just the key answer from the output.
///
/// Looks for well-known result fields (as JSON pointers into the result
/// envelope) in order of priority, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

/// Pointer to the headline figure and, optionally, a qualifier printed
/// in parentheses after it.
const PRIORITY: &[(&str, Option<&str>)] = &[
    ("/score/total", Some("/score/level")),
    ("/score/level", None),
    ("/level", Some("/distance_label")),
];

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for (pointer, qualifier) in PRIORITY {
        let Some(head) = result_obj.pointer(pointer).filter(|v| !v.is_null()) else {
            continue;
        };
        return match qualifier.and_then(|q| result_obj.pointer(q)) {
            Some(q) if !q.is_null() => {
                format!("{} ({})", format_minimal(head), format_minimal(q))
            }
            _ => format_minimal(head),
        };
    }

    match result_obj {
        Value::Object(map) => match map.iter().next() {
            Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
            None => String::new(),
        },
        Value::Array(rows) => format!("{} entries", rows.len()),
        other => format_minimal(other),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diagnostic_headline() {
        let v = json!({"result": {"score": {"total": "56", "level": "good"}}});
        assert_eq!(minimal_line(&v), "56 (good)");
    }

    #[test]
    fn test_null_total_falls_through_to_level() {
        let v = json!({"result": {"score": {"total": null, "level": "incomplete"}}});
        assert_eq!(minimal_line(&v), "incomplete");
    }

    #[test]
    fn test_benchmark_headline() {
        let v = json!({"result": {"level": "good", "distance_label": "+6.7% vs sector median"}});
        assert_eq!(minimal_line(&v), "good (+6.7% vs sector median)");
    }

    #[test]
    fn test_threshold_listing() {
        assert_eq!(minimal_line(&json!([{"metric": "dso"}, {"metric": "margin"}])), "2 entries");
    }
}
