//! SQL building utilities shared by the providers.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Characters with special meaning inside a LIKE pattern (with `\` as escape).
static LIKE_SPECIAL_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[%_\\]").unwrap());

/// Quote an SQL identifier (table or column name).
///
/// Embedded double quotes are doubled, so any attribute name is safe to
/// splice into a statement.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build a `LIKE ... ESCAPE '\'` pattern matching values that contain `text`.
///
/// - "jo" → `%jo%`
/// - "50%" → `%50\%%`
/// - "a_b" → `%a\_b%`
pub fn escape_like_pattern(text: &str) -> String {
    format!("%{}%", LIKE_SPECIAL_CHARS.replace_all(text, "\\$0"))
}

/// Textual form of a key value.
///
/// Strings are used as-is, `null` becomes the empty string and every other
/// value uses its JSON rendering.
pub fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Textual form of an attribute value for contains matching and display.
pub(crate) fn attribute_text(value: Option<&Value>) -> String {
    value.map(key_text).unwrap_or_default()
}
