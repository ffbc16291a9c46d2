//! Failure classification engine
//!
//! `classify` is a pure function over one pod's snapshot, events and logs.
//! `Diagnoser` wraps it with best-effort evidence gathering through an
//! `EvidenceSource`: only a failed pod fetch ends the diagnosis early
//! (as a `NotFound` report), missing events or logs degrade to empty.

mod rules;


pub use rules::{
    Rule, Signals, LOG_EVIDENCE_LINES, MAX_BACKOFF_EVENTS, RULES, SHORT_LOG_EVIDENCE_LINES,
};

use std::sync::Arc;
use std::time::Instant;

use crate::models::{EventRecord, LogBundle, PodIdentity, PodSnapshot};
use crate::observability::{DiagnosisMetrics, EvidenceKind, StructuredLogger};
use crate::report::{DiagnosisReport, FailureCategory};
use crate::source::EvidenceSource;

/// Log lines requested from the source per diagnosis
pub const DEFAULT_LOG_TAIL_LINES: i64 = 50;

/// Classify a pod. The first rule in `RULES` whose predicate holds builds
/// the report; `Unknown` is returned when none does.
pub fn classify(
    identity: &PodIdentity,
    snapshot: &PodSnapshot,
    events: &[EventRecord],
    logs: &LogBundle,
) -> DiagnosisReport {
    let signals = Signals::new(identity, snapshot, events, logs);

    RULES
        .iter()
        .find(|rule| (rule.matches)(&signals))
        .map(|rule| (rule.build)(&signals))
        .unwrap_or_else(|| rules::unknown(&signals))
}

/// Report for a pod that could not be fetched
pub fn not_found(identity: &PodIdentity, fetch_error: &str) -> DiagnosisReport {
    rules::not_found(identity, fetch_error)
}

/// Categories in evaluation order, ending with the fallback
pub fn evaluation_order() -> Vec<FailureCategory> {
    RULES
        .iter()
        .map(|rule| rule.category)
        .chain(std::iter::once(FailureCategory::Unknown))
        .collect()
}

/// Gathers evidence for a pod and classifies it
pub struct Diagnoser {
    source: Arc<dyn EvidenceSource>,
    log_tail_lines: i64,
    metrics: DiagnosisMetrics,
    logger: StructuredLogger,
}

impl Diagnoser {
    pub fn new(source: Arc<dyn EvidenceSource>) -> Self {
        Self {
            source,
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
            metrics: DiagnosisMetrics::new(),
            logger: StructuredLogger::new("pod-diagnoser"),
        }
    }

    /// Override the number of log lines fetched per diagnosis
    pub fn with_log_tail_lines(mut self, lines: i64) -> Self {
        self.log_tail_lines = lines;
        self
    }

    /// Use a logger tagged with the given service name
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Diagnose one pod. Always returns a report.
    pub async fn diagnose(&self, identity: &PodIdentity) -> DiagnosisReport {
        let started = Instant::now();

        let report = match self.source.fetch_pod(identity).await {
            Ok(snapshot) => {
                let events = self.fetch_events(identity).await;
                let logs = self.fetch_logs(identity).await;
                classify(identity, &snapshot, &events, &logs)
            }
            Err(err) => {
                let message = err.to_string();
                self.logger.log_pod_fetch_failed(identity, &message);
                not_found(identity, &message)
            }
        };

        let elapsed = started.elapsed();
        self.metrics
            .observe_diagnosis(report.category.as_str(), elapsed.as_secs_f64());
        self.logger
            .log_diagnosis(identity, &report, elapsed.as_millis());

        report
    }

    async fn fetch_events(&self, identity: &PodIdentity) -> Vec<EventRecord> {
        match self.source.fetch_events(identity).await {
            Ok(events) => events,
            Err(err) => {
                self.degraded(identity, EvidenceKind::Events, &err.to_string());
                Vec::new()
            }
        }
    }

    async fn fetch_logs(&self, identity: &PodIdentity) -> LogBundle {
        match self.source.fetch_logs(identity, self.log_tail_lines).await {
            Ok(raw) => LogBundle::from_raw(&raw),
            Err(err) => {
                self.degraded(identity, EvidenceKind::Logs, &err.to_string());
                LogBundle::empty()
            }
        }
    }

    fn degraded(&self, identity: &PodIdentity, kind: EvidenceKind, error: &str) {
        self.metrics.inc_evidence_degraded(kind);
        self.logger.log_evidence_degraded(identity, kind, error);
    }
}
