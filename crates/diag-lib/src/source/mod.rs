//! Evidence sources for pod diagnosis
//!
//! The engine never talks to the cluster directly. It asks an
//! `EvidenceSource` for the pod snapshot, its events and its logs.

mod cluster;
mod fixture;

pub use cluster::{
    context_display_name, kube_contexts, pod_namespaces, render_api_error, snapshot_from_pod,
    KubeContextInfo, KubeEvidenceSource, PodSummary, IN_CLUSTER_CONTEXT,
};
pub use fixture::{StaticEvidenceSource, StaticPod};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{EventRecord, PodIdentity, PodSnapshot};

/// Errors reported by evidence sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// The API server answered with an error status. The message keeps the
    /// `(code) Reason: ... HTTP response body: {...}` shape so it can be
    /// parsed back when the report is rendered.
    #[error("{0}")]
    Api(String),

    #[error("request to the API server failed: {0}")]
    Transport(String),

    #[error("failed to load cluster configuration: {0}")]
    Config(String),

    #[error("pod {0} not found")]
    NotFound(String),
}

/// Trait for retrieving diagnosis evidence for a pod
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Fetch the pod status. Failure here ends the diagnosis.
    async fn fetch_pod(&self, identity: &PodIdentity) -> Result<PodSnapshot, SourceError>;

    /// Fetch events recorded against the pod (best-effort)
    async fn fetch_events(&self, identity: &PodIdentity) -> Result<Vec<EventRecord>, SourceError>;

    /// Fetch the last `tail_lines` lines of pod logs (best-effort)
    async fn fetch_logs(&self, identity: &PodIdentity, tail_lines: i64) -> Result<String, SourceError>;

    /// Cheap connectivity check used for health reporting
    async fn ping(&self) -> Result<(), SourceError> {
        Ok(())
    }
}
