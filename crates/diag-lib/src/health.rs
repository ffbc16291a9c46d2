//! Health check infrastructure for the diagnosis service
//!
//! Tracks the Kubernetes client and the evidence source so the agent can
//! answer liveness and readiness probes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::SourceError;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Diagnoses still work but with reduced evidence
    Degraded,
    /// Diagnoses cannot reach the cluster
    Unhealthy,
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }

    /// Map the outcome of an evidence source ping to a health entry.
    /// An API error means the server answered, so it only degrades.
    pub fn from_source_check(outcome: &Result<(), SourceError>) -> Self {
        match outcome {
            Ok(()) => Self::healthy(),
            Err(err @ SourceError::Api(_)) => Self::degraded(err.to_string()),
            Err(err) => Self::unhealthy(err.to_string()),
        }
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across all components
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let statuses = components.values().map(|h| h.status);
        let mut overall = ComponentStatus::Healthy;

        for status in statuses {
            match status {
                ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
                ComponentStatus::Degraded => overall = ComponentStatus::Degraded,
                ComponentStatus::Healthy => {}
            }
        }

        overall
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    /// Client construction from kubeconfig or service account
    pub const KUBE_CLIENT: &str = "kube_client";
    /// Reachability of the API server serving evidence
    pub const EVIDENCE_SOURCE: &str = "evidence_source";
}

/// Health registry for tracking component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component with initial healthy status
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    /// Update component health status
    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), health);
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Record the outcome of an evidence source ping
    pub async fn record_source_check(&self, outcome: &Result<(), SourceError>) {
        self.update(
            components::EVIDENCE_SOURCE,
            ComponentHealth::from_source_check(outcome),
        )
        .await;
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let ready = *self.ready.read().await;
        let health = self.health().await;

        let reason = if !ready {
            Some("Service not yet initialized")
        } else if health.status == ComponentStatus::Unhealthy {
            Some("Cluster unreachable")
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_registry_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_health_registry_component_registration() {
        let registry = HealthRegistry::new();
        registry.register(components::KUBE_CLIENT).await;

        let health = registry.health().await;
        assert_eq!(
            health.components[components::KUBE_CLIENT].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_api_error_degrades_evidence_source() {
        let registry = HealthRegistry::new();
        registry.register(components::KUBE_CLIENT).await;

        registry
            .record_source_check(&Err(SourceError::Api("(403) Reason: Forbidden".to_string())))
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::EVIDENCE_SOURCE].message.as_deref(),
            Some("(403) Reason: Forbidden")
        );
    }

    #[tokio::test]
    async fn test_transport_error_marks_unhealthy() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;

        registry
            .record_source_check(&Err(SourceError::Transport("connection refused".to_string())))
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Cluster unreachable"));
    }

    #[tokio::test]
    async fn test_successful_check_recovers() {
        let registry = HealthRegistry::new();
        registry
            .set_unhealthy(components::EVIDENCE_SOURCE, "connection refused")
            .await;

        registry.record_source_check(&Ok(())).await;

        assert_eq!(registry.health().await.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_readiness_not_ready_initially() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
    }

    #[tokio::test]
    async fn test_readiness_ready_when_set() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;

        let readiness = registry.readiness().await;
        assert!(readiness.ready);
        assert!(readiness.reason.is_none());
    }
}
