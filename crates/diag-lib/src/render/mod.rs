//! Report rendering helpers shared by the agent and the CLI
//!
//! - Parsing of Kubernetes API error text
//! - Normalization of evidence into display sections

pub mod error_payload;
pub mod normalizer;

pub use error_payload::{parse as parse_error_payload, ErrorPayload, RESPONSE_BODY_MARKER};
pub use normalizer::{heading, humanize_key, normalize, Section, SectionBody};
