//! HTTP API for pod diagnosis, health checks and Prometheus metrics

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use diag_lib::{
    health::{ComponentStatus, HealthRegistry},
    render::{self, Section},
    DiagnosisReport, DiagnosisWithContext, Diagnoser, PodIdentity,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub diagnoser: Arc<Diagnoser>,
    /// Context name stamped on every pod identity
    pub cluster_context: String,
    pub cluster_name: Option<String>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        diagnoser: Arc<Diagnoser>,
        cluster_context: impl Into<String>,
    ) -> Self {
        Self {
            health_registry,
            diagnoser,
            cluster_context: cluster_context.into(),
            cluster_name: None,
        }
    }

    pub fn with_cluster_name(mut self, cluster_name: Option<String>) -> Self {
        self.cluster_name = cluster_name;
        self
    }

    fn identity(&self, namespace: String, pod_name: String) -> PodIdentity {
        PodIdentity::new(self.cluster_context.clone(), namespace, pod_name)
    }
}

/// Report plus its evidence normalized for display
#[derive(Debug, Serialize)]
pub struct SectionsResponse {
    pub report: DiagnosisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<&'static str>,
    pub sections: Vec<Section>,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Diagnose one pod. Always 200: a missing pod is a `not_found` report.
async fn diagnose(
    State(state): State<Arc<AppState>>,
    Path((namespace, pod)): Path<(String, String)>,
) -> Json<DiagnosisReport> {
    let identity = state.identity(namespace, pod);
    Json(state.diagnoser.diagnose(&identity).await)
}

async fn diagnose_sections(
    State(state): State<Arc<AppState>>,
    Path((namespace, pod)): Path<(String, String)>,
) -> Json<SectionsResponse> {
    let identity = state.identity(namespace, pod);
    let report = state.diagnoser.diagnose(&identity).await;

    Json(SectionsResponse {
        heading: render::heading(&report.evidence),
        sections: render::normalize(&report.evidence),
        report,
    })
}

/// Diagnose one pod and return the report with its follow-up context
async fn follow_up_context(
    State(state): State<Arc<AppState>>,
    Path((namespace, pod)): Path<(String, String)>,
) -> Json<DiagnosisWithContext> {
    let identity = state.identity(namespace, pod);
    let report = state.diagnoser.diagnose(&identity).await;

    Json(DiagnosisWithContext::new(
        &identity,
        state.cluster_name.as_deref(),
        report,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/diagnose/:namespace/:pod", get(diagnose))
        .route("/api/v1/diagnose/:namespace/:pod/sections", get(diagnose_sections))
        .route("/api/v1/diagnose/:namespace/:pod/context", get(follow_up_context))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
