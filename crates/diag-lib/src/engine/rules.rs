//! Priority-ordered classification rules
//!
//! `RULES` is evaluated top to bottom and the first matching entry builds
//! the report. The order is part of the contract: log signatures are
//! checked before `CrashLoopBackOff` on purpose.

use crate::models::{EventRecord, LogBundle, PodIdentity, PodPhase, PodSnapshot};
use crate::report::{DiagnosisReport, Evidence, FailureCategory};

/// Log lines surfaced for log-driven categories
pub const LOG_EVIDENCE_LINES: usize = 15;

/// Log lines surfaced for status-driven categories
pub const SHORT_LOG_EVIDENCE_LINES: usize = 10;

/// Maximum back-off/crash events attached to a crash-loop report
pub const MAX_BACKOFF_EVENTS: usize = 5;

const DNS_FAILURE_PATTERNS: &[&str] = &[
    "no such host",
    "temporary failure in name resolution",
    "nxdomain",
    "servfail",
];

/// Signatures of automated internet scanners hitting an exposed service
const SCANNER_PATTERNS: &[&str] = &[
    "hnap1",
    "solr",
    "cgi-bin",
    "masscan",
    "nmap",
    "paloaltonetworks",
    "odin",
    "favicon.ico",
    "go-http-client",
];

const APPLICATION_ERROR_PATTERNS: &[&str] = &["error", "exception", "fatal", "panic"];

/// Everything a rule may look at, derived once per diagnosis
pub struct Signals<'a> {
    pub identity: &'a PodIdentity,
    pub phase: PodPhase,
    pub current_reason: String,
    pub last_termination_reason: String,
    pub restart_count: u32,
    pub events: Vec<String>,
    pub logs: &'a LogBundle,
    pub log_text: String,
}

impl<'a> Signals<'a> {
    pub fn new(
        identity: &'a PodIdentity,
        snapshot: &PodSnapshot,
        events: &[EventRecord],
        logs: &'a LogBundle,
    ) -> Self {
        Self {
            identity,
            phase: snapshot.phase,
            current_reason: snapshot.current_reason().to_lowercase(),
            last_termination_reason: snapshot.last_termination_reason().to_lowercase(),
            restart_count: snapshot.total_restart_count(),
            events: events.iter().map(EventRecord::render).collect(),
            logs,
            log_text: logs.search_text(),
        }
    }

    fn logs_contain_any(&self, patterns: &[&str]) -> bool {
        patterns.iter().any(|p| self.log_text.contains(p))
    }

    fn events_matching(&self, needles: &[&str]) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| {
                let lower = e.to_lowercase();
                needles.iter().any(|n| lower.contains(n))
            })
            .cloned()
            .collect()
    }
}

/// One entry of the rule table
pub struct Rule {
    pub category: FailureCategory,
    pub matches: fn(&Signals) -> bool,
    pub build: fn(&Signals) -> DiagnosisReport,
}

pub const RULES: &[Rule] = &[
    Rule {
        category: FailureCategory::ImagePullFailure,
        matches: |s| {
            s.current_reason.contains("imagepullbackoff") || s.current_reason.contains("errimagepull")
        },
        build: |s| {
            report(
                FailureCategory::ImagePullFailure,
                "The pod is unable to download the container image.",
                "The specified image name or tag may not exist, or access to the registry is denied.",
                Evidence::List(s.events.clone()),
                "Verify the image name and tag in your Deployment file. \
                 Also ensure the image exists and that Kubernetes has permission to pull it.",
            )
        },
    },
    Rule {
        category: FailureCategory::SchedulingOrVolumeFailure,
        matches: |s| {
            s.events
                .iter()
                .any(|e| e.contains("FailedScheduling") || e.contains("FailedMount"))
        },
        build: |s| {
            report(
                FailureCategory::SchedulingOrVolumeFailure,
                "The pod could not be scheduled or mounted correctly.",
                "There are insufficient node resources or an issue with volume/PVC attachment.",
                Evidence::List(s.events.clone()),
                "Check node CPU & memory availability, verify PersistentVolumeClaims, \
                 and ensure volume mounts are correctly configured.",
            )
        },
    },
    Rule {
        category: FailureCategory::DnsFailure,
        matches: |s| s.logs_contain_any(DNS_FAILURE_PATTERNS),
        build: |s| {
            report(
                FailureCategory::DnsFailure,
                "The pod is unable to resolve DNS hostnames.",
                "Cluster DNS (CoreDNS) issue or incorrect service hostname being used.",
                Evidence::List(s.logs.tail(LOG_EVIDENCE_LINES)),
                "Ensure CoreDNS pods are running and verify that the hostname or service name is correct. \
                 Try running nslookup inside the pod to confirm DNS resolution.",
            )
        },
    },
    Rule {
        category: FailureCategory::PermissionFailure,
        matches: |s| s.log_text.contains("permission denied"),
        build: |s| {
            report(
                FailureCategory::PermissionFailure,
                "The application failed due to file permission restrictions.",
                "The container does not have sufficient permissions for required files or directories.",
                Evidence::List(s.logs.tail(LOG_EVIDENCE_LINES)),
                "Adjust file permissions, container user settings, or volume access rights.",
            )
        },
    },
    Rule {
        category: FailureCategory::NetworkTimeout,
        matches: |s| s.log_text.contains("timeout"),
        build: |s| {
            report(
                FailureCategory::NetworkTimeout,
                "The pod experienced network connectivity delays.",
                "The application could not reach another service or external endpoint.",
                Evidence::List(s.logs.tail(LOG_EVIDENCE_LINES)),
                "Verify target service availability, network policies, and DNS configuration.",
            )
        },
    },
    Rule {
        category: FailureCategory::OutOfMemoryKill,
        matches: |s| s.last_termination_reason.contains("oomkilled"),
        build: |s| {
            report(
                FailureCategory::OutOfMemoryKill,
                "The pod was terminated due to excessive memory usage.",
                "The application exceeded its assigned memory limit.",
                Evidence::structured()
                    .field("restart_count", s.restart_count.to_string())
                    .field("logs", s.logs.tail(SHORT_LOG_EVIDENCE_LINES))
                    .build(),
                "Increase memory limits or optimize the application's memory consumption.",
            )
        },
    },
    Rule {
        category: FailureCategory::ProbeFailure,
        matches: |s| !s.events_matching(&["probe failed"]).is_empty(),
        build: |s| {
            report(
                FailureCategory::ProbeFailure,
                "Health checks are failing for this pod.",
                "The pod is not responding properly to readiness or liveness probes.",
                Evidence::List(s.events_matching(&["probe failed"])),
                "Ensure your health endpoints (/health or /ready) return HTTP 200 consistently.",
            )
        },
    },
    Rule {
        category: FailureCategory::ScannerTraffic,
        matches: |s| s.logs_contain_any(SCANNER_PATTERNS),
        build: |s| {
            report(
                FailureCategory::ScannerTraffic,
                "Non-critical external scan traffic detected.",
                "Automated internet scanners probing the exposed service.",
                Evidence::List(s.logs.tail(SHORT_LOG_EVIDENCE_LINES)),
                "This is normal behavior. No action is required.",
            )
        },
    },
    Rule {
        category: FailureCategory::ApplicationError,
        matches: |s| s.logs_contain_any(APPLICATION_ERROR_PATTERNS),
        build: |s| {
            report(
                FailureCategory::ApplicationError,
                "Application-level errors detected in logs.",
                "Internal code or configuration issue in the application.",
                Evidence::List(s.logs.tail(LOG_EVIDENCE_LINES)),
                "Review detailed logs and fix application-level issues.",
            )
        },
    },
    Rule {
        category: FailureCategory::CrashLoopBackOff,
        matches: |s| s.current_reason.contains("crashloopbackoff"),
        build: |s| {
            let mut backoff_events = s.events_matching(&["back-off", "crash"]);
            backoff_events.truncate(MAX_BACKOFF_EVENTS);

            DiagnosisReport {
                category: FailureCategory::CrashLoopBackOff,
                summary: format!(
                    "Pod '{}' is repeatedly crashing and restarting.",
                    s.identity.pod_name
                ),
                likely_cause: "The container process is failing during startup, \
                               causing Kubernetes to restart it continuously."
                    .to_string(),
                evidence: Evidence::structured()
                    .field("restart_count", s.restart_count.to_string())
                    .field("state", "CrashLoopBackOff")
                    .field("relevant_events", backoff_events)
                    .field("last_logs", s.logs.tail(SHORT_LOG_EVIDENCE_LINES))
                    .build(),
                recommendation: "Inspect application startup behavior and verify configuration, \
                                 environment variables, and required dependencies."
                    .to_string(),
            }
        },
    },
    Rule {
        category: FailureCategory::PodPending,
        matches: |s| s.phase == PodPhase::Pending,
        build: |s| {
            report(
                FailureCategory::PodPending,
                "The pod is waiting to be scheduled.",
                "Insufficient node resources or scheduling conflicts.",
                Evidence::List(s.events.clone()),
                "Check node capacity and scaling configuration.",
            )
        },
    },
    Rule {
        category: FailureCategory::PodRunningHealthy,
        matches: |s| s.phase == PodPhase::Running,
        build: |s| {
            report(
                FailureCategory::PodRunningHealthy,
                "The pod is healthy and running normally.",
                "No operational issues detected.",
                Evidence::List(s.logs.tail(SHORT_LOG_EVIDENCE_LINES)),
                "No intervention required.",
            )
        },
    },
];

/// Report returned when no rule in `RULES` matched
pub fn unknown(s: &Signals) -> DiagnosisReport {
    DiagnosisReport {
        category: FailureCategory::Unknown,
        summary: format!(
            "No clear failure pattern found for pod '{}'.",
            s.identity.pod_name
        ),
        likely_cause: "The issue does not match any known diagnostic patterns.".to_string(),
        evidence: Evidence::structured()
            .field("phase", s.phase.as_str())
            .field("restart_count", s.restart_count.to_string())
            .field("events", s.events.clone())
            .field("logs", s.logs.tail(SHORT_LOG_EVIDENCE_LINES))
            .build(),
        recommendation: "Inspect logs and describe output manually for deeper analysis."
            .to_string(),
    }
}

/// Report returned when the pod itself could not be fetched
pub fn not_found(identity: &PodIdentity, fetch_error: &str) -> DiagnosisReport {
    DiagnosisReport {
        category: FailureCategory::NotFound,
        summary: format!(
            "Pod '{}' could not be found in the cluster.",
            identity.pod_name
        ),
        likely_cause: "The pod name may be incorrect or it no longer exists in this namespace."
            .to_string(),
        evidence: Evidence::Text(fetch_error.to_string()),
        recommendation: "Double-check the pod name and selected namespace, then try again."
            .to_string(),
    }
}

fn report(
    category: FailureCategory,
    summary: &str,
    likely_cause: &str,
    evidence: Evidence,
    recommendation: &str,
) -> DiagnosisReport {
    DiagnosisReport {
        category,
        summary: summary.to_string(),
        likely_cause: likely_cause.to_string(),
        evidence,
        recommendation: recommendation.to_string(),
    }
}
