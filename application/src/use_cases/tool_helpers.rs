//! Shared helpers for tool use cases.

use serde_json::Value;

/// Extract a short preview string from tool call arguments.
///
/// Looks for well-known keys (`expression`, `location`, `query`, `action`,
/// `to`) first, then falls back to the first string value found.
pub fn tool_args_preview(arguments: &Value) -> String {
    let Some(map) = arguments.as_object() else {
        return String::new();
    };
    let keys = ["expression", "location", "query", "action", "to"];
    for key in &keys {
        if let Some(Value::String(s)) = map.get(*key) {
            return truncate_preview(s, 50);
        }
    }
    // Fallback: first string value
    for value in map.values() {
        if let Some(s) = value.as_str() {
            return truncate_preview(s, 50);
        }
    }
    String::new()
}

fn truncate_preview(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
