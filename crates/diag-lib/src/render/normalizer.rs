//! Evidence normalization
//!
//! Turns any `Evidence` value into an ordered list of labelled sections
//! that front-ends can render without knowing which rule produced the
//! report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error_payload::{self, has_response_body};
use crate::report::{Evidence, EvidenceField, EvidenceValue};

/// Structured field rendered separately, after every other field
pub const LAST_LOGS_FIELD: &str = "last_logs";

/// API error keys that carry no diagnostic value
const SUPPRESSED_PAYLOAD_KEYS: &[&str] = &["kind", "apiVersion", "metadata", "code"];

/// Body of a rendered section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum SectionBody {
    Line(String),
    Bullets(Vec<String>),
    Code(String),
}

/// A labelled piece of evidence ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub body: SectionBody,
}

impl Section {
    fn line(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Line(text.into()),
        }
    }

    fn bullets(title: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Bullets(items),
        }
    }

    fn code(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Code(text.into()),
        }
    }
}

/// Heading a front-end should show above the sections, if any
pub fn heading(evidence: &Evidence) -> Option<&'static str> {
    match evidence {
        Evidence::Text(text) if has_response_body(text) => Some("Kubernetes API Error"),
        Evidence::Text(_) => Some("Pod Description Analysis"),
        Evidence::List(_) | Evidence::Structured(_) => None,
    }
}

/// Normalize evidence into display sections
pub fn normalize(evidence: &Evidence) -> Vec<Section> {
    match evidence {
        Evidence::Text(text) if has_response_body(text) => api_error_sections(text),
        Evidence::Text(text) => vec![Section::code("Pod Description Analysis", text.as_str())],
        Evidence::List(entries) => vec![Section::code("Logs / Events", entries.join("\n"))],
        Evidence::Structured(fields) => structured_sections(fields),
    }
}

fn api_error_sections(text: &str) -> Vec<Section> {
    error_payload::parse(text)
        .iter()
        .filter(|(key, _)| !SUPPRESSED_PAYLOAD_KEYS.contains(&key.as_str()))
        .filter_map(|(key, value)| payload_section(key, value))
        .collect()
}

fn payload_section(key: &str, value: &Value) -> Option<Section> {
    let title = humanize_key(key);

    match value {
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            Some(Section::code(title, pretty))
        }
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(Section::bullets(title, items.iter().map(scalar_text).collect())),
        other => Some(Section::line(title, scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn structured_sections(fields: &[EvidenceField]) -> Vec<Section> {
    let mut sections: Vec<Section> = fields
        .iter()
        .filter(|f| f.key != LAST_LOGS_FIELD)
        .filter_map(|f| match &f.value {
            EvidenceValue::List(items) if items.is_empty() => None,
            EvidenceValue::List(items) => Some(Section::bullets(humanize_key(&f.key), items.clone())),
            EvidenceValue::Text(text) => Some(Section::line(humanize_key(&f.key), text.as_str())),
        })
        .collect();

    if let Some(last_logs) = fields.iter().find(|f| f.key == LAST_LOGS_FIELD) {
        let text = match &last_logs.value {
            EvidenceValue::List(lines) => lines.join("\n"),
            EvidenceValue::Text(text) => text.clone(),
        };
        if !text.trim().is_empty() {
            sections.push(Section::code("Latest Logs", text));
        }
    }

    sections
}

/// `restart_count` -> `Restart Count`
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
