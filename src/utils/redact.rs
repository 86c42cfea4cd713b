use crate::error::AppResult;
use serde_json::Value as JsonValue;

/// Redact personal and pay data from JSON payloads before they reach the logs.
/// Masks names, free-text comments and monetary amounts; ids, dates and
/// ratings are kept so requests stay traceable.
pub fn redact_sensitive_data(data: &JsonValue) -> AppResult<JsonValue> {
    let redacted = redact_value(data);
    Ok(redacted)
}

fn redact_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut redacted_map = serde_json::Map::new();
            for (key, val) in map {
                let redacted_val = if is_sensitive_field(key) {
                    redact_scalar(val)
                } else {
                    redact_value(val)
                };
                redacted_map.insert(key.clone(), redacted_val);
            }
            JsonValue::Object(redacted_map)
        }
        JsonValue::Array(arr) => {
            let redacted_arr: Vec<JsonValue> = arr.iter().map(redact_value).collect();
            JsonValue::Array(redacted_arr)
        }
        _ => value.clone(),
    }
}

fn is_sensitive_field(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    matches!(
        lower.as_str(),
        "name"
            | "employeename"
            | "reviewername"
            | "comment"
            | "comments"
            | "amount"
            | "basicsalary"
            | "salary"
            | "token"
            | "apitoken"
            | "password"
    )
}

fn redact_scalar(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if !s.is_empty() => JsonValue::String("[REDACTED]".to_string()),
        JsonValue::Number(_) => JsonValue::String("[REDACTED]".to_string()),
        _ => value.clone(),
    }
}
