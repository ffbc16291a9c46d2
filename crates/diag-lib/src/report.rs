//! Diagnosis report produced by the classification engine

use serde::{Deserialize, Serialize};

/// Failure category a report is classified under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    NotFound,
    ImagePullFailure,
    SchedulingOrVolumeFailure,
    DnsFailure,
    PermissionFailure,
    NetworkTimeout,
    OutOfMemoryKill,
    ProbeFailure,
    ScannerTraffic,
    ApplicationError,
    CrashLoopBackOff,
    PodPending,
    PodRunningHealthy,
    Unknown,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::NotFound => "not_found",
            FailureCategory::ImagePullFailure => "image_pull_failure",
            FailureCategory::SchedulingOrVolumeFailure => "scheduling_or_volume_failure",
            FailureCategory::DnsFailure => "dns_failure",
            FailureCategory::PermissionFailure => "permission_failure",
            FailureCategory::NetworkTimeout => "network_timeout",
            FailureCategory::OutOfMemoryKill => "out_of_memory_kill",
            FailureCategory::ProbeFailure => "probe_failure",
            FailureCategory::ScannerTraffic => "scanner_traffic",
            FailureCategory::ApplicationError => "application_error",
            FailureCategory::CrashLoopBackOff => "crash_loop_back_off",
            FailureCategory::PodPending => "pod_pending",
            FailureCategory::PodRunningHealthy => "pod_running_healthy",
            FailureCategory::Unknown => "unknown",
        }
    }

    /// Whether the category describes a problem an operator should act on
    pub fn needs_attention(&self) -> bool {
        !matches!(
            self,
            FailureCategory::ScannerTraffic | FailureCategory::PodRunningHealthy
        )
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a single structured evidence field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidenceValue {
    Text(String),
    List(Vec<String>),
}

impl From<String> for EvidenceValue {
    fn from(value: String) -> Self {
        EvidenceValue::Text(value)
    }
}

impl From<&str> for EvidenceValue {
    fn from(value: &str) -> Self {
        EvidenceValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for EvidenceValue {
    fn from(value: Vec<String>) -> Self {
        EvidenceValue::List(value)
    }
}

/// Named field of structured evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceField {
    pub key: String,
    pub value: EvidenceValue,
}

/// Evidence backing a diagnosis
///
/// Structured evidence keeps its fields in insertion order so that
/// rendering is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Evidence {
    Text(String),
    List(Vec<String>),
    Structured(Vec<EvidenceField>),
}

impl Evidence {
    /// Start building structured evidence
    pub fn structured() -> StructuredBuilder {
        StructuredBuilder { fields: Vec::new() }
    }
}

/// Builder for `Evidence::Structured`
pub struct StructuredBuilder {
    fields: Vec<EvidenceField>,
}

impl StructuredBuilder {
    pub fn field(mut self, key: &str, value: impl Into<EvidenceValue>) -> Self {
        self.fields.push(EvidenceField {
            key: key.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn build(self) -> Evidence {
        Evidence::Structured(self.fields)
    }
}

/// Outcome of a single diagnosis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub category: FailureCategory,
    pub summary: String,
    pub likely_cause: String,
    pub evidence: Evidence,
    pub recommendation: String,
}
