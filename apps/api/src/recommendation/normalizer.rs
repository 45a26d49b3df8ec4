//! Recommendation Normalizer: turns whatever a provider returned into a
//! `CanonicalResponse`, or reports why it could not.
//!
//! Order of attempts (first success wins):
//! 1. function-call arguments (`tool_calls[0].function.arguments`, legacy `function_call.arguments`)
//! 2. free-form text content, searched with `extract::parse_embedded_json`
//! 3. the raw body itself, when it is already a bare plan object
//!
//! Then `paths` aliases are renamed and the validity predicate is applied.
//! Only the FIRST path is checked for steps. Past the predicate nothing fails:
//! the plan is read leniently (see `CanonicalResponse::from_json_lenient`) and
//! later paths are passed through as returned.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::recommendation::extract::parse_embedded_json;
use crate::recommendation::models::CanonicalResponse;

/// Minimum steps the first path must carry.
pub const MIN_STEPS: usize = 2;

/// Alternate top-level keys models use for `paths`, in lookup order.
const PATH_ALIASES: [&str; 4] = [
    "learning_paths",
    "learningPaths",
    "recommended_paths",
    "recommendations",
];

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("no JSON object found in provider output")]
    NoJson,

    #[error("missing \"paths\" array")]
    MissingPaths,

    #[error("\"paths\" is empty")]
    EmptyPaths,

    #[error("first path has {found} steps, need at least 2")]
    TooFewSteps { found: usize },
}

/// Normalizes raw provider output. Deterministic and side-effect free.
pub fn normalize(raw: &Value) -> Result<CanonicalResponse, FormatError> {
    let mut parsed = extract_payload(raw).ok_or(FormatError::NoJson)?;

    apply_path_aliases(&mut parsed);
    check_validity(&parsed)?;

    let mut plan = CanonicalResponse::from_json_lenient(parsed);
    drop_invalid_resources(&mut plan);

    Ok(plan)
}

/// Validity predicate: a non-empty `paths` array whose first entry has at
/// least `MIN_STEPS` steps.
pub fn check_validity(value: &Value) -> Result<(), FormatError> {
    let paths = value
        .get("paths")
        .and_then(Value::as_array)
        .ok_or(FormatError::MissingPaths)?;
    let first = paths.first().ok_or(FormatError::EmptyPaths)?;

    let found = first
        .get("steps")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if found < MIN_STEPS {
        return Err(FormatError::TooFewSteps { found });
    }

    Ok(())
}

fn extract_payload(raw: &Value) -> Option<Value> {
    if let Some(payload) = function_call_payload(raw) {
        return Some(payload);
    }

    if let Some(text) = text_content(raw) {
        return parse_embedded_json(&text);
    }

    // Chat envelopes without usable content are not plans.
    if raw.is_object() && raw.get("choices").is_none() {
        return Some(raw.clone());
    }

    None
}

fn function_call_payload(raw: &Value) -> Option<Value> {
    let message = raw.pointer("/choices/0/message")?;
    let arguments = message
        .pointer("/tool_calls/0/function/arguments")
        .or_else(|| message.pointer("/function_call/arguments"))?;

    match arguments {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(v) if v.is_object() => Some(v),
            _ => {
                debug!("function-call arguments are not a JSON object, trying content");
                None
            }
        },
        Value::Object(_) => Some(arguments.clone()),
        _ => None,
    }
}

fn text_content(raw: &Value) -> Option<String> {
    if let Some(s) = raw.as_str() {
        return Some(s.to_string());
    }

    match raw.pointer("/choices/0/message/content") {
        Some(Value::String(s)) => return Some(s.clone()),
        // Content-part arrays: [{"type": "text", "text": "..."}]
        Some(Value::Array(parts)) => {
            let text: String = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            if !text.is_empty() {
                return Some(text);
            }
        }
        _ => {}
    }

    raw.pointer("/choices/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn apply_path_aliases(value: &mut Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    if object.contains_key("paths") {
        return;
    }

    for alias in PATH_ALIASES {
        if object.get(alias).is_some_and(Value::is_array) {
            if let Some(paths) = object.remove(alias) {
                debug!("renaming \"{alias}\" to \"paths\"");
                object.insert("paths".to_string(), paths);
            }
            return;
        }
    }
}

fn drop_invalid_resources(plan: &mut CanonicalResponse) {
    for step in plan.paths.iter_mut().flat_map(|p| p.steps.iter_mut()) {
        let before = step.resources.len();
        step.resources.retain(|r| Url::parse(&r.url).is_ok());
        if step.resources.len() != before {
            debug!(
                "dropped {} resource(s) with invalid urls from step '{}'",
                before - step.resources.len(),
                step.title
            );
        }
    }
}
