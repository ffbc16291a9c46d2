//! Parsing of Kubernetes API error text
//!
//! API errors arrive as free text such as
//! `(404) Reason: NotFound\nHTTP response body: {"kind":"Status",...}`.
//! The parser pulls the status code, reason and the decoded JSON body into
//! one ordered mapping. Malformed bodies never fail the parse.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Marker preceding the JSON body in an API error message
pub const RESPONSE_BODY_MARKER: &str = "HTTP response body:";

/// Parsed error payload, keys in insertion order
pub type ErrorPayload = Map<String, Value>;

fn status_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\((\d+)\)\s+Reason:\s+([A-Za-z]+)").expect("status pattern is valid")
    })
}

/// Whether the text carries an API response body
pub fn has_response_body(text: &str) -> bool {
    text.contains(RESPONSE_BODY_MARKER)
}

/// Parse raw API error text into a key/value mapping
pub fn parse(raw: &str) -> ErrorPayload {
    let mut payload = ErrorPayload::new();

    if let Some(caps) = status_pattern().captures(raw) {
        payload.insert("status_code".to_string(), Value::String(caps[1].to_string()));
        payload.insert("reason".to_string(), Value::String(caps[2].to_string()));
    }

    if let Some((_, body)) = raw.split_once(RESPONSE_BODY_MARKER) {
        let body = body.trim();
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(fields)) => {
                for (key, value) in fields {
                    payload.insert(key, value);
                }
            }
            _ => {
                tracing::debug!("API error body is not a JSON object, keeping raw text");
                payload.insert("full_body".to_string(), Value::String(body.to_string()));
            }
        }
    }

    payload
}
