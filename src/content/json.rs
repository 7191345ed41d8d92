use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

/// Key of the wrapper produced when model output is not valid JSON.
pub const UNPARSED_KEY: &str = "raw_output";

static FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```[A-Za-z]*[ \t]*\r?\n?|```[ \t]*$").unwrap());

/// Parse model output that should be JSON.
///
/// Markdown fences are stripped first. When the whole text does not parse,
/// the outermost `{…}` or `[…]` block is tried. Anything else becomes
/// `{"raw_output": <text>}` so it can still be persisted and inspected.
/// Blank input yields `Value::Null`.
pub fn parse_structured(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return Value::Null;
    }

    let cleaned = FENCE_REGEX.replace_all(raw, "");
    let cleaned = cleaned.trim();
    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return value;
    }

    if let Some(block) = embedded_block(cleaned)
        && let Ok(value) = serde_json::from_str::<Value>(block)
    {
        return value;
    }

    json!({ UNPARSED_KEY: raw })
}

pub fn is_unparsed(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.len() == 1 && map.contains_key(UNPARSED_KEY))
}

fn embedded_block(text: &str) -> Option<&str> {
    let object = span(text, '{', '}');
    let array = span(text, '[', ']');
    match (object, array) {
        (Some(o), Some(a)) => Some(if a.0 < o.0 { a } else { o }),
        (o, a) => o.or(a),
    }
    .map(|(start, end)| &text[start..=end])
}

fn span(text: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then_some((start, end))
}
