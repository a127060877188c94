//! JSON classification and subset containment.
//!
//! Bodies arrive as raw text. Only text that parses as a JSON object or as
//! `null` takes part in structured comparison; everything else is compared as
//! plain text. `null` stands for an empty object.

use crate::error::{Error, JsonSubject, Result};
use serde_json::{Map, Value};

/// A parsed JSON object.
pub type JsonMap = Map<String, Value>;

/// Check whether the text is a JSON object or `null`.
pub fn is_json_string(s: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(s),
        Ok(Value::Object(_) | Value::Null)
    )
}

/// Parse a JSON object, reporting `subject` as the offending side on failure.
pub fn parse_to_map(s: &str, subject: JsonSubject) -> Result<JsonMap> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(JsonMap::new()),
        _ => Err(Error::not_valid_json(subject, s)),
    }
}

/// Recursive subset containment.
///
/// Objects: every key of `subset` must be present in `superset` with a
/// contained value; extra keys in `superset` are ignored. Arrays must have
/// the same length and contain element-wise. Numbers compare by value, so
/// `1` and `1.0` are equal.
pub fn contains(superset: &Value, subset: &Value) -> bool {
    match (superset, subset) {
        (Value::Object(sup), Value::Object(sub)) => contains_map(sup, sub),
        (Value::Array(sup), Value::Array(sub)) => {
            sup.len() == sub.len() && sup.iter().zip(sub).all(|(a, b)| contains(a, b))
        }
        (Value::Number(a), Value::Number(b)) => {
            a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
        }
        (a, b) => a == b,
    }
}

/// [`contains`] for two objects.
pub fn contains_map(superset: &JsonMap, subset: &JsonMap) -> bool {
    subset.iter().all(|(key, expected)| {
        superset
            .get(key)
            .is_some_and(|actual| contains(actual, expected))
    })
}

/// Read a string field, failing with a typed error when it's absent or not
/// a string.
pub fn get_str<'a>(map: &'a JsonMap, field: &str) -> Result<&'a str> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        other => Err(Error::InvalidFieldType {
            field: field.to_string(),
            expected: "string",
            found: other.map_or("missing", type_name),
        }),
    }
}

/// JSON type name of a value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
