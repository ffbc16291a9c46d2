//! Pod Diag Agent - Kubernetes pod failure diagnosis service
//!
//! Runs as a Deployment (or locally against a kubeconfig context) and
//! answers diagnosis requests over HTTP.

use anyhow::{Context, Result};
use diag_agent::{api, config::AgentConfig};
use diag_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    source::{EvidenceSource, KubeEvidenceSource},
    Diagnoser,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");
const SERVICE_NAME: &str = "pod-diag-agent";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting pod-diag-agent");

    let config = AgentConfig::load()?;
    info!(
        api_port = config.api_port,
        kube_context = config.kube_context.as_deref().unwrap_or("<inferred>"),
        log_tail_lines = config.log_tail_lines,
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();

    let source = KubeEvidenceSource::connect(config.kube_context.as_deref())
        .await
        .context("failed to build Kubernetes client")?;
    health_registry.register(components::KUBE_CLIENT).await;
    health_registry.register(components::EVIDENCE_SOURCE).await;

    let logger = StructuredLogger::new(SERVICE_NAME);
    logger.log_startup(AGENT_VERSION, source.context_name());

    let cluster_context = source.context_name().to_string();
    let source: Arc<dyn EvidenceSource> = Arc::new(source);
    let diagnoser = Diagnoser::new(source.clone())
        .with_log_tail_lines(config.log_tail_lines)
        .with_logger(logger.clone());

    let app_state = Arc::new(
        api::AppState::new(health_registry.clone(), Arc::new(diagnoser), cluster_context)
            .with_cluster_name(config.cluster_name.clone()),
    );

    tokio::spawn(check_source(
        source,
        health_registry.clone(),
        Duration::from_secs(config.source_check_interval_secs.max(1)),
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            result.context("API server task panicked")??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}

/// Periodically ping the API server and record the outcome
async fn check_source(source: Arc<dyn EvidenceSource>, registry: HealthRegistry, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;
        let outcome = source.ping().await;
        registry.record_source_check(&outcome).await;
    }
}
