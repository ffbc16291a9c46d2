//! Pod failure diagnosis library
//!
//! This crate provides the core functionality for:
//! - Gathering pod status, events and logs from a cluster
//! - Rule-based failure classification
//! - Rendering Kubernetes API errors and evidence for display
//! - Follow-up question context
//! - Health checks and observability

pub mod engine;
pub mod followup;
pub mod health;
pub mod models;
pub mod observability;
pub mod render;
pub mod report;
pub mod source;

pub use engine::{classify, evaluation_order, Diagnoser, DEFAULT_LOG_TAIL_LINES};
pub use followup::{DiagnosisWithContext, FollowUpContext};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{DiagnosisMetrics, StructuredLogger};
pub use report::{DiagnosisReport, Evidence, EvidenceField, EvidenceValue, FailureCategory};
pub use source::{EvidenceSource, SourceError};
