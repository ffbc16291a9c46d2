//! Observability infrastructure for pod diagnosis
//!
//! Provides:
//! - Prometheus metrics (diagnoses per category, diagnosis latency, degraded evidence)
//! - Structured JSON logging with tracing

use prometheus::{register_histogram, register_int_counter_vec, Histogram, IntCounterVec};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::PodIdentity;
use crate::report::DiagnosisReport;

/// Histogram buckets for diagnosis latency (in seconds). A diagnosis is
/// three API round trips, so the range is wider than a single request.
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DiagnosisMetricsInner> = OnceLock::new();

/// Evidence kinds that may degrade to empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    Events,
    Logs,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Events => "events",
            EvidenceKind::Logs => "logs",
        }
    }
}

struct DiagnosisMetricsInner {
    diagnoses_total: IntCounterVec,
    diagnosis_latency_seconds: Histogram,
    evidence_degraded_total: IntCounterVec,
}

impl DiagnosisMetricsInner {
    fn new() -> Self {
        Self {
            diagnoses_total: register_int_counter_vec!(
                "pod_diag_diagnoses_total",
                "Number of diagnoses produced, by failure category",
                &["category"]
            )
            .expect("Failed to register diagnoses_total"),

            diagnosis_latency_seconds: register_histogram!(
                "pod_diag_diagnosis_latency_seconds",
                "Time spent gathering evidence and classifying a pod",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register diagnosis_latency_seconds"),

            evidence_degraded_total: register_int_counter_vec!(
                "pod_diag_evidence_degraded_total",
                "Number of diagnoses that ran without events or logs because the fetch failed",
                &["evidence"]
            )
            .expect("Failed to register evidence_degraded_total"),
        }
    }
}

/// Diagnosis metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct DiagnosisMetrics {
    _private: (),
}

impl Default for DiagnosisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DiagnosisMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DiagnosisMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a finished diagnosis
    pub fn observe_diagnosis(&self, category: &str, duration_secs: f64) {
        self.inner()
            .diagnoses_total
            .with_label_values(&[category])
            .inc();
        self.inner().diagnosis_latency_seconds.observe(duration_secs);
    }

    /// Record that a piece of evidence could not be fetched
    pub fn inc_evidence_degraded(&self, kind: EvidenceKind) {
        self.inner()
            .evidence_degraded_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }
}

/// Structured logger for diagnosis events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Log a completed diagnosis
    pub fn log_diagnosis(&self, identity: &PodIdentity, report: &DiagnosisReport, duration_ms: u128) {
        if report.category.needs_attention() {
            warn!(
                event = "pod_diagnosed",
                service = %self.service,
                cluster_context = %identity.cluster_context,
                namespace = %identity.namespace,
                pod_name = %identity.pod_name,
                category = %report.category,
                duration_ms = duration_ms as u64,
                "Pod diagnosed with a failure pattern"
            );
        } else {
            info!(
                event = "pod_diagnosed",
                service = %self.service,
                cluster_context = %identity.cluster_context,
                namespace = %identity.namespace,
                pod_name = %identity.pod_name,
                category = %report.category,
                duration_ms = duration_ms as u64,
                "Pod diagnosed"
            );
        }
    }

    /// Log evidence that degraded to empty
    pub fn log_evidence_degraded(&self, identity: &PodIdentity, kind: EvidenceKind, error: &str) {
        warn!(
            event = "evidence_degraded",
            service = %self.service,
            namespace = %identity.namespace,
            pod_name = %identity.pod_name,
            evidence = kind.as_str(),
            error = %error,
            "Evidence unavailable, continuing without it"
        );
    }

    /// Log a pod that could not be fetched
    pub fn log_pod_fetch_failed(&self, identity: &PodIdentity, error: &str) {
        warn!(
            event = "pod_fetch_failed",
            service = %self.service,
            namespace = %identity.namespace,
            pod_name = %identity.pod_name,
            error = %error,
            "Pod could not be fetched"
        );
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, cluster_context: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            cluster_context = %cluster_context,
            "Pod diagnosis service started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Pod diagnosis service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnosis_metrics_creation() {
        let metrics = DiagnosisMetrics::new();

        metrics.observe_diagnosis("pod_running_healthy", 0.02);
        metrics.inc_evidence_degraded(EvidenceKind::Logs);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "pod_diag_diagnoses_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-service");
        assert_eq!(logger.service, "test-service");
    }
}
