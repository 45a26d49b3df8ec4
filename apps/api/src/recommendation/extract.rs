//! Locates a JSON object inside free-form model output.
//!
//! Candidates are tried in a fixed precedence order and the first one that
//! parses as a JSON object wins:
//! 1. the whole (trimmed) text,
//! 2. each code fence labelled `json`, in order of appearance,
//! 3. each top-level brace-balanced `{…}` substring, in order of appearance.
//!
//! Brace matching ignores braces inside JSON string literals, so nested
//! objects and values such as `"use {x}"` do not cut a candidate short.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

static JSON_FENCE: OnceLock<Regex> = OnceLock::new();

fn json_fence() -> &'static Regex {
    JSON_FENCE.get_or_init(|| {
        Regex::new(r"(?is)```[ \t]*json\b\s*(.*?)```").expect("json fence pattern is valid")
    })
}

/// Bodies of every ```json fenced block, trimmed, in order of appearance.
pub fn fenced_json_blocks(text: &str) -> Vec<&str> {
    json_fence()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Every top-level `{…}` substring whose braces balance, in order of appearance.
/// A `{` that is never closed is skipped and the scan resumes right after it.
pub fn balanced_objects(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut from = 0usize;

    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        match object_len(&text[start..]) {
            Some(len) => {
                found.push(&text[start..start + len]);
                from = start + len;
            }
            None => from = start + 1,
        }
    }

    found
}

/// Byte length of the object opening at the start of `text`, if it closes.
fn object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// All extraction candidates in precedence order. May contain duplicates.
pub fn json_candidates(text: &str) -> Vec<&str> {
    let trimmed = text.trim();
    let mut candidates = Vec::new();
    if !trimmed.is_empty() {
        candidates.push(trimmed);
    }
    candidates.extend(fenced_json_blocks(text));
    candidates.extend(balanced_objects(text));
    candidates
}

/// The first candidate that parses as a JSON object.
pub fn parse_embedded_json(text: &str) -> Option<Value> {
    json_candidates(text)
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .find(Value::is_object)
}
