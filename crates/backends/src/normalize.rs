//! Response normalization
//!
//! Each provider answers in its own shape. These functions reduce a raw
//! response to the translated text using explicit, ordered fallbacks.

use serde_json::{Map, Value};

use crate::BackendError;

/// Keys checked, in order, on remote inference result objects
pub const INFERENCE_TEXT_KEYS: [&str; 3] = ["translation_text", "translated_text", "text"];

/// Key emitted by translation pipelines
pub const PIPELINE_TEXT_KEY: &str = "translation_text";

/// Extract translated text from a remote inference response
///
/// - `[{...}, ...]`: known keys on the first object, then its first string
///   field, then the first object serialized
/// - `{...}`: first string field, then the object serialized
/// - `"..."`: the string itself
/// - anything else: the value serialized
pub fn extract_inference_text(data: &Value) -> String {
    match data {
        Value::Array(items) => match items.first() {
            Some(Value::Object(entry)) => INFERENCE_TEXT_KEYS
                .iter()
                .find_map(|key| entry.get(*key))
                .map(value_text)
                .or_else(|| first_string_field(entry))
                .unwrap_or_else(|| Value::Object(entry.clone()).to_string()),
            _ => data.to_string(),
        },
        Value::Object(entry) => {
            first_string_field(entry).unwrap_or_else(|| data.to_string())
        }
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Extract translated text from a translation pipeline's output
///
/// Uses the first entry's `translation_text`, else the first value of that
/// entry, else the whole output serialized.
pub fn extract_pipeline_text(output: &Value) -> String {
    if let Some(Value::Object(entry)) = output.as_array().and_then(|items| items.first()) {
        if let Some(text) = entry.get(PIPELINE_TEXT_KEY) {
            return value_text(text);
        }
        if let Some((_, first)) = entry.iter().next() {
            return value_text(first);
        }
    }
    output.to_string()
}

/// Parse a keyless Google Translate response
///
/// The body is a nested array: segments at `[0]`, each segment's text at
/// `[0][i][0]`, the detected source language at `[2]`. Returns the joined
/// text and the detected language when present.
pub fn parse_google_response(data: &Value) -> Result<(String, Option<String>), BackendError> {
    let segments = data
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::InvalidResponse("missing segment array".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(BackendError::InvalidResponse(
            "empty translation received".to_string(),
        ));
    }

    let detected = data
        .get(2)
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    Ok((translated, detected))
}

fn first_string_field(entry: &Map<String, Value>) -> Option<String> {
    entry.values().find_map(|v| v.as_str().map(str::to_string))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
