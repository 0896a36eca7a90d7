//! Lenient readers for request fields that clients send either as JSON values
//! or as form-style strings.

use serde_json::Value;

use crate::error::{AppError, AppResult};

/// A JSON integer. Strings, floats and out of range numbers are rejected.
pub fn strict_int(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|v| i32::try_from(v).ok())
}

/// A non-negative id given as a JSON integer or as a string of digits.
pub fn numeric_id(value: &Value) -> Option<i32> {
    match value {
        Value::Number(_) => strict_int(value).filter(|id| *id >= 0),
        Value::String(s) => digits(s),
        _ => None,
    }
}

fn digits(s: &str) -> Option<i32> {
    let s = s.trim();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Ids from `"1,2,3"` or `[1, "2", 3]`. Entries that are not numeric are
/// dropped.
pub fn id_list(value: &Value) -> Vec<i32> {
    match value {
        Value::String(s) => s.split(',').filter_map(digits).collect(),
        Value::Array(items) => items.iter().filter_map(numeric_id).collect(),
        other => numeric_id(other).into_iter().collect(),
    }
}

/// A JSON array, possibly wrapped in a string (form posts send it that way).
pub fn json_array(value: &Value) -> AppResult<Vec<Value>> {
    let invalid = || AppError::BadRequest("Invalid request format".into());
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s).map_err(|_| invalid())? {
            Value::Array(items) => Ok(items),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

/// Boolean flags in the forms `true`, `1`, `"yes"`, `"off"`, ...
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
            "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_from_comma_separated_string_skip_garbage() {
        assert_eq!(id_list(&json!("1, 2,abc,,-3,4")), vec![1, 2, 4]);
    }

    #[test]
    fn ids_from_array_accept_digit_strings() {
        assert_eq!(id_list(&json!([5, "6", "x", 7.5, -1])), vec![5, 6]);
    }

    #[test]
    fn strict_int_rejects_strings_and_floats() {
        assert_eq!(strict_int(&json!(3)), Some(3));
        assert_eq!(strict_int(&json!("3")), None);
        assert_eq!(strict_int(&json!("two")), None);
        assert_eq!(strict_int(&json!(2.5)), None);
    }

    #[test]
    fn json_array_unwraps_string_payloads() {
        let items = json_array(&json!(r#"[{"id": 1}]"#)).unwrap();
        assert_eq!(items, vec![json!({ "id": 1 })]);
        assert!(json_array(&json!("not json")).is_err());
        assert!(json_array(&json!({ "id": 1 })).is_err());
    }

    #[test]
    fn truthy_follows_common_spellings() {
        assert_eq!(truthy(&json!("On")), Some(true));
        assert_eq!(truthy(&json!("0")), Some(false));
        assert_eq!(truthy(&json!(false)), Some(false));
        assert_eq!(truthy(&json!("maybe")), None);
    }
}
