//! Secret-aware helpers for log output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

const REDACTED: &str = "[REDACTED]";

/// Key fragments that mark a field as carrying a secret.
const SENSITIVE_KEY_FRAGMENTS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "apikey",
    "api_key",
    "privatekey",
    "private_key",
    "authorization",
    "credential",
    "clientsecret",
];

/// Each pattern captures `(prefix)(value)(suffix)`; only the value is replaced.
static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)("[a-z0-9_\-]*(?:password|passwd|secret|token|api[_\-]?key|private[_\-]?key)[a-z0-9_\-]*"\s*:\s*")((?:[^"\\]|\\.)*)(")"#,
        r"(?i)(x-n8n-api-key:\s*)(\S+)()",
        r"(?i)(authorization:\s*(?:bearer|basic)?\s*)([\w\-\.=:/+]+)()",
        r"(?i)(bearer\s+)([\w\-\.=:/+]+)()",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Mask secret-looking values in free text (including serialized JSON).
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REDACTED}{suffix}")
            })
            .to_string();
    }
    redacted
}

/// Whether a field name denotes a secret.
pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.to_ascii_lowercase().replace('-', "_");
    let compact = normalized.replace('_', "");
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| normalized.contains(fragment) || compact.contains(fragment))
}

/// Whether any key at any depth of `params` denotes a secret.
pub fn contains_sensitive_fields(params: &Value) -> bool {
    match params {
        Value::Object(map) => map
            .iter()
            .any(|(key, value)| is_sensitive_key(key) || contains_sensitive_fields(value)),
        Value::Array(items) => items.iter().any(contains_sensitive_fields),
        _ => false,
    }
}
