//! Kubernetes-backed evidence source
//!
//! Reads the pod, its events and its logs through the API server using
//! the credentials of a kubeconfig context (or the in-cluster service
//! account when no context is given).

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ContainerStatus, Event, Pod};
use kube::api::{ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::error::ErrorResponse;
use kube::{Api, Client, Config};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use super::{EvidenceSource, SourceError};
use crate::models::{ContainerStatusSnapshot, EventRecord, PodIdentity, PodPhase, PodSnapshot};

/// Context name reported when running on the in-cluster service account
pub const IN_CLUSTER_CONTEXT: &str = "in-cluster";

/// Evidence source talking to a live cluster
#[derive(Clone)]
pub struct KubeEvidenceSource {
    client: Client,
    context_name: String,
}

impl KubeEvidenceSource {
    /// Wrap an existing client
    pub fn new(client: Client, context_name: impl Into<String>) -> Self {
        Self {
            client,
            context_name: context_name.into(),
        }
    }

    /// Build a client for the given kubeconfig context, or infer the
    /// configuration (default kubeconfig, then in-cluster) when `None`
    pub async fn connect(context: Option<&str>) -> Result<Self, SourceError> {
        let (config, context_name) = match context {
            Some(ctx) => {
                let options = KubeConfigOptions {
                    context: Some(ctx.to_string()),
                    ..Default::default()
                };
                let config = Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| SourceError::Config(format!("context '{}': {}", ctx, e)))?;
                (config, ctx.to_string())
            }
            None => {
                let config = Config::infer()
                    .await
                    .map_err(|e| SourceError::Config(e.to_string()))?;
                // infer() prefers the local kubeconfig over the service account
                let context_name = Kubeconfig::read()
                    .ok()
                    .and_then(|k| k.current_context)
                    .unwrap_or_else(|| IN_CLUSTER_CONTEXT.to_string());
                (config, context_name)
            }
        };

        Self::from_config(config, context_name)
    }

    /// Build a client from an explicit kubeconfig file. Without `context`
    /// the file's current context is used.
    pub async fn connect_with_kubeconfig(
        path: &Path,
        context: Option<&str>,
    ) -> Result<Self, SourceError> {
        let kubeconfig = Kubeconfig::read_from(path)
            .map_err(|e| SourceError::Config(format!("{}: {}", path.display(), e)))?;
        let context_name = context
            .map(str::to_string)
            .or_else(|| kubeconfig.current_context.clone())
            .unwrap_or_default();

        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| SourceError::Config(format!("context '{}': {}", context_name, e)))?;

        Self::from_config(config, context_name)
    }

    fn from_config(config: Config, context_name: String) -> Result<Self, SourceError> {
        let client = Client::try_from(config).map_err(|e| SourceError::Config(e.to_string()))?;
        info!(context = %context_name, "Connected Kubernetes client");

        Ok(Self::new(client, context_name))
    }

    /// Name of the context this source was built for
    pub fn context_name(&self) -> &str {
        &self.context_name
    }

    fn pod_api(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Namespaces that currently hold at least one pod, sorted
    pub async fn namespaces(&self) -> Result<Vec<String>, SourceError> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let list = pods.list(&ListParams::default()).await.map_err(source_error)?;
        debug!(count = list.items.len(), "Listed pods in all namespaces");

        Ok(pod_namespaces(&list.items))
    }

    /// Pods of one namespace with their phase and restart count
    pub async fn pods(&self, namespace: &str) -> Result<Vec<PodSummary>, SourceError> {
        let list = self
            .pod_api(namespace)
            .list(&ListParams::default())
            .await
            .map_err(source_error)?;
        debug!(namespace, count = list.items.len(), "Listed pods");

        Ok(list.items.iter().map(PodSummary::from_pod).collect())
    }
}

/// One line of a pod listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodSummary {
    pub name: String,
    pub namespace: String,
    pub phase: PodPhase,
    /// First waiting/terminated reason, empty when none
    pub reason: String,
    pub restart_count: u32,
}

impl PodSummary {
    pub fn from_pod(pod: &Pod) -> Self {
        let snapshot = snapshot_from_pod(pod);

        Self {
            name: pod.metadata.name.clone().unwrap_or_default(),
            namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            phase: snapshot.phase,
            reason: snapshot.current_reason().to_string(),
            restart_count: snapshot.total_restart_count(),
        }
    }
}

/// Distinct namespaces of `pods`, sorted
pub fn pod_namespaces(pods: &[Pod]) -> Vec<String> {
    let mut namespaces: Vec<String> = pods
        .iter()
        .filter_map(|p| p.metadata.namespace.clone())
        .collect();
    namespaces.sort();
    namespaces.dedup();
    namespaces
}

#[async_trait]
impl EvidenceSource for KubeEvidenceSource {
    async fn fetch_pod(&self, identity: &PodIdentity) -> Result<PodSnapshot, SourceError> {
        let pod = self
            .pod_api(&identity.namespace)
            .get(&identity.pod_name)
            .await
            .map_err(source_error)?;

        Ok(snapshot_from_pod(&pod))
    }

    async fn fetch_events(&self, identity: &PodIdentity) -> Result<Vec<EventRecord>, SourceError> {
        let events: Api<Event> = Api::namespaced(self.client.clone(), &identity.namespace);
        let params =
            ListParams::default().fields(&format!("involvedObject.name={}", identity.pod_name));

        let list = events.list(&params).await.map_err(source_error)?;
        debug!(pod = %identity, count = list.items.len(), "Fetched pod events");

        Ok(list.items.iter().map(event_record).collect())
    }

    async fn fetch_logs(&self, identity: &PodIdentity, tail_lines: i64) -> Result<String, SourceError> {
        let params = LogParams {
            tail_lines: Some(tail_lines),
            ..Default::default()
        };

        self.pod_api(&identity.namespace)
            .logs(&identity.pod_name, &params)
            .await
            .map_err(source_error)
    }

    async fn ping(&self) -> Result<(), SourceError> {
        self.client
            .apiserver_version()
            .await
            .map(|_| ())
            .map_err(source_error)
    }
}

/// Convert a pod object into the snapshot the engine works on
pub fn snapshot_from_pod(pod: &Pod) -> PodSnapshot {
    let status = pod.status.as_ref();
    let phase = PodPhase::parse(status.and_then(|s| s.phase.as_deref()));
    let container_statuses = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(container_snapshot).collect())
        .unwrap_or_default();

    PodSnapshot::new(phase, container_statuses)
}

fn container_snapshot(status: &ContainerStatus) -> ContainerStatusSnapshot {
    let state = status.state.as_ref();

    ContainerStatusSnapshot {
        waiting_reason: state
            .and_then(|s| s.waiting.as_ref())
            .and_then(|w| w.reason.clone()),
        terminated_reason: state
            .and_then(|s| s.terminated.as_ref())
            .and_then(|t| t.reason.clone()),
        last_terminated_reason: status
            .last_state
            .as_ref()
            .and_then(|s| s.terminated.as_ref())
            .and_then(|t| t.reason.clone()),
        restart_count: u32::try_from(status.restart_count).unwrap_or(0),
    }
}

fn event_record(event: &Event) -> EventRecord {
    EventRecord::new(
        event.reason.clone().unwrap_or_default(),
        event.message.clone().unwrap_or_default(),
    )
}

fn source_error(err: kube::Error) -> SourceError {
    match err {
        kube::Error::Api(response) => SourceError::Api(render_api_error(&response)),
        other => SourceError::Transport(other.to_string()),
    }
}

/// Render an API error status as `(code) Reason: <reason>` followed by the
/// JSON status object after an `HTTP response body:` marker
pub fn render_api_error(response: &ErrorResponse) -> String {
    let body = serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": response.status,
        "message": response.message,
        "reason": response.reason,
        "code": response.code,
    });

    format!(
        "({}) Reason: {}\nHTTP response body: {}",
        response.code, response.reason, body
    )
}

/// A kubeconfig context as offered to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KubeContextInfo {
    pub context_name: String,
    /// Short name: the part after the last `_` (GKE/EKS style names)
    pub display_name: String,
    pub is_active: bool,
}

/// List contexts from the kubeconfig at `path`, or the default location
pub fn kube_contexts(path: Option<&Path>) -> Result<Vec<KubeContextInfo>, SourceError> {
    let kubeconfig = match path {
        Some(p) => Kubeconfig::read_from(p),
        None => Kubeconfig::read(),
    }
    .map_err(|e| SourceError::Config(e.to_string()))?;

    let active = kubeconfig.current_context.as_deref();

    Ok(kubeconfig
        .contexts
        .iter()
        .map(|ctx| KubeContextInfo {
            context_name: ctx.name.clone(),
            display_name: context_display_name(&ctx.name).to_string(),
            is_active: active == Some(ctx.name.as_str()),
        })
        .collect())
}

/// Short name for a context: the part after the last `_`
pub fn context_display_name(context_name: &str) -> &str {
    context_name.rsplit('_').next().unwrap_or(context_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{
        ContainerState, ContainerStateTerminated, ContainerStateWaiting, PodStatus,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn named_pod(namespace: &str, name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn waiting(reason: &str) -> ContainerState {
        ContainerState {
            waiting: Some(ContainerStateWaiting {
                reason: Some(reason.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn terminated(reason: &str) -> ContainerState {
        ContainerState {
            terminated: Some(ContainerStateTerminated {
                reason: Some(reason.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_snapshot_from_pod() {
        let pod = Pod {
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                container_statuses: Some(vec![
                    ContainerStatus {
                        name: "app".to_string(),
                        state: Some(waiting("CrashLoopBackOff")),
                        last_state: Some(terminated("OOMKilled")),
                        restart_count: 5,
                        ..Default::default()
                    },
                    ContainerStatus {
                        name: "sidecar".to_string(),
                        restart_count: 1,
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let snapshot = snapshot_from_pod(&pod);

        assert_eq!(snapshot.phase, PodPhase::Running);
        assert_eq!(snapshot.current_reason(), "CrashLoopBackOff");
        assert_eq!(snapshot.last_termination_reason(), "OOMKilled");
        assert_eq!(snapshot.total_restart_count(), 6);
    }

    #[test]
    fn test_snapshot_from_pod_without_status() {
        let snapshot = snapshot_from_pod(&Pod::default());

        assert_eq!(snapshot.phase, PodPhase::Unknown);
        assert!(snapshot.container_statuses.is_empty());
    }

    #[test]
    fn test_pod_namespaces_sorted_and_distinct() {
        let pods = vec![
            named_pod("payments", "api-1"),
            named_pod("default", "web"),
            named_pod("payments", "api-2"),
            Pod::default(),
            named_pod("kube-system", "coredns"),
        ];

        assert_eq!(pod_namespaces(&pods), vec!["default", "kube-system", "payments"]);
        assert!(pod_namespaces(&[]).is_empty());
    }

    #[test]
    fn test_pod_summary_from_pod() {
        let mut pod = named_pod("payments", "api-7d9f");
        pod.status = Some(PodStatus {
            phase: Some("Running".to_string()),
            container_statuses: Some(vec![ContainerStatus {
                name: "app".to_string(),
                state: Some(waiting("CrashLoopBackOff")),
                restart_count: 4,
                ..Default::default()
            }]),
            ..Default::default()
        });

        let summary = PodSummary::from_pod(&pod);

        assert_eq!(summary.name, "api-7d9f");
        assert_eq!(summary.namespace, "payments");
        assert_eq!(summary.phase, PodPhase::Running);
        assert_eq!(summary.reason, "CrashLoopBackOff");
        assert_eq!(summary.restart_count, 4);
    }

    #[test]
    fn test_render_api_error_shape() {
        let response = ErrorResponse {
            status: "Failure".to_string(),
            message: "pods \"web\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        };

        let rendered = render_api_error(&response);

        assert!(rendered.starts_with("(404) Reason: NotFound\nHTTP response body: {"));
        let body = rendered.split_once("HTTP response body:").unwrap().1.trim();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["message"], "pods \"web\" not found");
        assert_eq!(json["kind"], "Status");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(context_display_name("gke_my-project_us-central1_prod"), "prod");
        assert_eq!(context_display_name("kind-dev"), "kind-dev");
    }

    #[test]
    fn test_kube_contexts_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(
            &path,
            r#"apiVersion: v1
kind: Config
current-context: gke_proj_zone_prod
clusters: []
users: []
contexts:
- name: gke_proj_zone_prod
  context:
    cluster: prod
    user: prod
- name: kind-dev
  context:
    cluster: dev
    user: dev
"#,
        )
        .unwrap();

        let contexts = kube_contexts(Some(&path)).unwrap();

        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].display_name, "prod");
        assert!(contexts[0].is_active);
        assert_eq!(contexts[1].display_name, "kind-dev");
        assert!(!contexts[1].is_active);
    }
}
