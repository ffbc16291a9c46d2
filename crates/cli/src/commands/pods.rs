//! Pod listing for one namespace

use anyhow::{Context, Result};
use colored::Colorize;
use diag_lib::{source::PodSummary, PodPhase};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::output::{print_json, print_warning, OutputFormat};

/// Row for pods table
#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Restarts")]
    restarts: u32,
}

impl From<PodSummary> for PodRow {
    fn from(pod: PodSummary) -> Self {
        let phase = match pod.phase {
            PodPhase::Running | PodPhase::Succeeded => pod.phase.as_str().green(),
            PodPhase::Pending => pod.phase.as_str().yellow(),
            PodPhase::Failed | PodPhase::Unknown => pod.phase.as_str().red(),
        };

        Self {
            name: pod.name,
            phase: phase.to_string(),
            reason: if pod.reason.is_empty() {
                "-".to_string()
            } else {
                pod.reason
            },
            restarts: pod.restart_count,
        }
    }
}

/// List the pods of `namespace` with phase, reason and restart count
pub async fn list_pods(
    kubeconfig: Option<&Path>,
    context: Option<&str>,
    namespace: &str,
    format: OutputFormat,
) -> Result<()> {
    let source = super::connect(kubeconfig, context).await?;
    let pods = source
        .pods(namespace)
        .await
        .with_context(|| format!("Failed to list pods in namespace {}", namespace))?;

    match format {
        OutputFormat::Json => print_json(&pods)?,
        OutputFormat::Text => {
            if pods.is_empty() {
                print_warning(&format!("No pods found in namespace {}", namespace));
                return Ok(());
            }

            let rows: Vec<PodRow> = pods.into_iter().map(PodRow::from).collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
