//! Field decoders that accept the shapes models actually return.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?))
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let s = value_to_string(Value::deserialize(d)?);
    Ok((!s.is_empty()).then_some(s))
}

pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let list = match Value::deserialize(d)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        Value::String(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
        other => vec![value_to_string(other)],
    };
    Ok(list.into_iter().filter(|s| !s.is_empty()).collect())
}

pub fn opt_score<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let score = match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    Ok(score
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| s.round() as u32))
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
