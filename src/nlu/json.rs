//! Recover a JSON object from free-form model output.
//!
//! Models wrap answers in prose or code fences. Tried in order: a fenced
//! `json` code block, then the first balanced `{...}` in the text.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").ok());

/// First complete JSON object, respecting strings and escapes.
pub fn first_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' if start.is_some() => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|p| &text[p..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the first JSON object found in `text`.
pub fn parse_object(text: &str) -> Option<Value> {
    let fenced = FENCED
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok());
    fenced
        .or_else(|| first_object(text).and_then(|s| serde_json::from_str(s).ok()))
        .filter(Value::is_object)
}
