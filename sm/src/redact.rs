//! Scrubbing of secrets from values before they reach the log

use serde_json::{Map, Value};

/// Key fragments that mark a value as sensitive (matched case-insensitively)
const SENSITIVE_KEYS: &[&str] = &[
    "apikey",
    "api_key",
    "x-api-key",
    "authorization",
    "password",
    "token",
    "secret",
    "cookie",
    "session",
    "credentials",
];

const MAX_STRING_LEN: usize = 1000;

const REDACTED: &str = "[REDACTED]";

pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|fragment| lower.contains(fragment))
}

/// Copy of `value` with sensitive keys replaced and long strings truncated
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let cleaned = if is_sensitive_key(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        sanitize(value)
                    };
                    (key.clone(), cleaned)
                })
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        Value::String(s) if s.chars().count() > MAX_STRING_LEN => {
            let head: String = s.chars().take(MAX_STRING_LEN).collect();
            Value::String(format!("{head}... [truncated]"))
        }
        other => other.clone(),
    }
}
