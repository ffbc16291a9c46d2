//! Core data models for pod diagnosis
//!
//! Everything here is built fresh for a single diagnosis request and
//! dropped once the report has been produced.

use serde::{Deserialize, Serialize};

/// Identity of the pod being diagnosed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodIdentity {
    /// Kubeconfig context (or "in-cluster") the pod lives behind
    pub cluster_context: String,
    pub namespace: String,
    pub pod_name: String,
}

impl PodIdentity {
    pub fn new(
        cluster_context: impl Into<String>,
        namespace: impl Into<String>,
        pod_name: impl Into<String>,
    ) -> Self {
        Self {
            cluster_context: cluster_context.into(),
            namespace: namespace.into(),
            pod_name: pod_name.into(),
        }
    }
}

impl std::fmt::Display for PodIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.pod_name)
    }
}

/// Coarse lifecycle phase of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl PodPhase {
    /// Parse the phase string reported by the API server.
    /// Anything unrecognized (or missing) maps to `Unknown`.
    pub fn parse(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-container status as far as diagnosis cares about it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatusSnapshot {
    pub waiting_reason: Option<String>,
    pub terminated_reason: Option<String>,
    pub last_terminated_reason: Option<String>,
    pub restart_count: u32,
}

impl ContainerStatusSnapshot {
    /// Waiting reason if present, otherwise the terminated reason
    fn current_reason(&self) -> Option<&str> {
        non_empty(self.waiting_reason.as_deref()).or(non_empty(self.terminated_reason.as_deref()))
    }
}

/// Point-in-time view of a pod's status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSnapshot {
    pub phase: PodPhase,
    pub container_statuses: Vec<ContainerStatusSnapshot>,
}

impl PodSnapshot {
    pub fn new(phase: PodPhase, container_statuses: Vec<ContainerStatusSnapshot>) -> Self {
        Self {
            phase,
            container_statuses,
        }
    }

    /// First non-empty waiting/terminated reason, in container order
    pub fn current_reason(&self) -> &str {
        self.container_statuses
            .iter()
            .find_map(ContainerStatusSnapshot::current_reason)
            .unwrap_or("")
    }

    /// First non-empty reason of a previous termination
    pub fn last_termination_reason(&self) -> &str {
        self.container_statuses
            .iter()
            .find_map(|c| non_empty(c.last_terminated_reason.as_deref()))
            .unwrap_or("")
    }

    /// Sum of restart counts over all containers
    pub fn total_restart_count(&self) -> u32 {
        self.container_statuses
            .iter()
            .map(|c| c.restart_count)
            .sum()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// A control-plane event recorded against the pod
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub reason: String,
    pub message: String,
}

impl EventRecord {
    pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Text used for matching and display: `reason: message`
    pub fn render(&self) -> String {
        format!("{}: {}", self.reason, self.message)
    }
}

/// Most recent log lines of the pod, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBundle {
    lines: Vec<String>,
}

impl LogBundle {
    /// Split raw log output into lines
    pub fn from_raw(raw: &str) -> Self {
        Self {
            lines: raw.lines().map(str::to_string).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The last `n` lines, case preserved
    pub fn tail(&self, n: usize) -> Vec<String> {
        let start = self.lines.len().saturating_sub(n);
        self.lines[start..].to_vec()
    }

    /// All lines joined and lower-cased, for keyword matching
    pub fn search_text(&self) -> String {
        self.lines.join("\n").to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(
        waiting: Option<&str>,
        terminated: Option<&str>,
        last: Option<&str>,
        restarts: u32,
    ) -> ContainerStatusSnapshot {
        ContainerStatusSnapshot {
            waiting_reason: waiting.map(String::from),
            terminated_reason: terminated.map(String::from),
            last_terminated_reason: last.map(String::from),
            restart_count: restarts,
        }
    }

    #[test]
    fn test_current_reason_takes_first_non_empty_container() {
        let snapshot = PodSnapshot::new(
            PodPhase::Running,
            vec![
                container(Some(""), None, None, 0),
                container(None, Some("Completed"), None, 1),
                container(Some("CrashLoopBackOff"), None, None, 2),
            ],
        );

        assert_eq!(snapshot.current_reason(), "Completed");
    }

    #[test]
    fn test_waiting_reason_wins_within_container() {
        let snapshot = PodSnapshot::new(
            PodPhase::Running,
            vec![container(Some("ImagePullBackOff"), Some("Error"), None, 0)],
        );

        assert_eq!(snapshot.current_reason(), "ImagePullBackOff");
    }

    #[test]
    fn test_derived_fields_default_to_empty() {
        let snapshot = PodSnapshot::default();

        assert_eq!(snapshot.current_reason(), "");
        assert_eq!(snapshot.last_termination_reason(), "");
        assert_eq!(snapshot.total_restart_count(), 0);
        assert_eq!(snapshot.phase, PodPhase::Unknown);
    }

    #[test]
    fn test_restart_count_sums_containers() {
        let snapshot = PodSnapshot::new(
            PodPhase::Running,
            vec![
                container(None, None, Some("OOMKilled"), 3),
                container(None, None, Some("Error"), 4),
            ],
        );

        assert_eq!(snapshot.total_restart_count(), 7);
        assert_eq!(snapshot.last_termination_reason(), "OOMKilled");
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!(PodPhase::parse(Some("Pending")), PodPhase::Pending);
        assert_eq!(PodPhase::parse(Some("Running")), PodPhase::Running);
        assert_eq!(PodPhase::parse(Some("Evicted")), PodPhase::Unknown);
        assert_eq!(PodPhase::parse(None), PodPhase::Unknown);
    }

    #[test]
    fn test_log_bundle_tail_and_search_text() {
        let logs = LogBundle::from_raw("one\nTwo\nTHREE\n");

        assert_eq!(logs.lines().len(), 3);
        assert_eq!(logs.tail(2), vec!["Two".to_string(), "THREE".to_string()]);
        assert_eq!(logs.tail(10).len(), 3);
        assert_eq!(logs.search_text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_event_render() {
        let event = EventRecord::new("BackOff", "Back-off restarting failed container");
        assert_eq!(event.render(), "BackOff: Back-off restarting failed container");
    }
}
