//! Subcommand implementations

pub mod contexts;
pub mod diagnose;
pub mod namespaces;
pub mod pods;

use anyhow::{Context, Result};
use diag_lib::source::KubeEvidenceSource;
use std::path::Path;

/// Connect to the cluster of a kubeconfig context
pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<KubeEvidenceSource> {
    match kubeconfig {
        Some(path) => KubeEvidenceSource::connect_with_kubeconfig(path, context).await,
        None => KubeEvidenceSource::connect(context).await,
    }
    .context("Failed to connect to the cluster")
}
