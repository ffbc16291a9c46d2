//! In-memory evidence source
//!
//! Serves canned pods. Used by tests and by the agent's integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{EvidenceSource, SourceError};
use crate::models::{EventRecord, PodIdentity, PodSnapshot};

/// Canned evidence for one pod. `None` events/logs simulate a failed fetch.
#[derive(Debug, Clone, Default)]
pub struct StaticPod {
    pub snapshot: PodSnapshot,
    pub events: Option<Vec<EventRecord>>,
    pub logs: Option<String>,
}

impl StaticPod {
    pub fn new(snapshot: PodSnapshot) -> Self {
        Self {
            snapshot,
            events: Some(Vec::new()),
            logs: Some(String::new()),
        }
    }

    pub fn with_events(mut self, events: Vec<EventRecord>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_logs(mut self, logs: impl Into<String>) -> Self {
        self.logs = Some(logs.into());
        self
    }

    pub fn with_failing_events(mut self) -> Self {
        self.events = None;
        self
    }

    pub fn with_failing_logs(mut self) -> Self {
        self.logs = None;
        self
    }
}

/// Evidence source backed by a map of `(namespace, pod)` to canned evidence
#[derive(Debug, Default)]
pub struct StaticEvidenceSource {
    pods: HashMap<(String, String), StaticPod>,
    fetches: AtomicUsize,
}

impl StaticEvidenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod(mut self, namespace: &str, pod_name: &str, pod: StaticPod) -> Self {
        self.pods
            .insert((namespace.to_string(), pod_name.to_string()), pod);
        self
    }

    /// Number of fetch calls served so far, of any kind
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, identity: &PodIdentity) -> Result<&StaticPod, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pods
            .get(&(identity.namespace.clone(), identity.pod_name.clone()))
            .ok_or_else(|| SourceError::NotFound(identity.to_string()))
    }
}

#[async_trait]
impl EvidenceSource for StaticEvidenceSource {
    async fn fetch_pod(&self, identity: &PodIdentity) -> Result<PodSnapshot, SourceError> {
        Ok(self.lookup(identity)?.snapshot.clone())
    }

    async fn fetch_events(&self, identity: &PodIdentity) -> Result<Vec<EventRecord>, SourceError> {
        self.lookup(identity)?
            .events
            .clone()
            .ok_or_else(|| SourceError::Transport("events unavailable".to_string()))
    }

    async fn fetch_logs(&self, identity: &PodIdentity, tail_lines: i64) -> Result<String, SourceError> {
        let logs = self
            .lookup(identity)?
            .logs
            .as_deref()
            .ok_or_else(|| SourceError::Transport("logs unavailable".to_string()))?;

        let lines: Vec<&str> = logs.lines().collect();
        let keep = usize::try_from(tail_lines).unwrap_or(0).min(lines.len());
        Ok(lines[lines.len() - keep..].join("\n"))
    }
}
