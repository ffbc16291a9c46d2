//! Namespace listing

use anyhow::{Context, Result};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::output::{print_json, print_warning, OutputFormat};

#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Namespace")]
    name: String,
}

/// List the namespaces that hold pods in the cluster of `context`
pub async fn list_namespaces(
    kubeconfig: Option<&Path>,
    context: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let source = super::connect(kubeconfig, context).await?;
    let namespaces = source
        .namespaces()
        .await
        .context("Failed to list namespaces")?;

    match format {
        OutputFormat::Json => print_json(&namespaces)?,
        OutputFormat::Text => {
            if namespaces.is_empty() {
                print_warning("No pods found in any namespace");
                return Ok(());
            }

            let rows: Vec<NamespaceRow> = namespaces
                .into_iter()
                .map(|name| NamespaceRow { name })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
