//! Kubeconfig context listing

use anyhow::{Context, Result};
use diag_lib::source::kube_contexts;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::output::{active_marker, print_json, print_warning, OutputFormat};

/// Row for contexts table
#[derive(Tabled)]
struct ContextRow {
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Context")]
    context: String,
}

/// List the contexts of a kubeconfig with their short display names
pub fn list_contexts(kubeconfig: Option<&Path>, format: OutputFormat) -> Result<()> {
    let contexts = kube_contexts(kubeconfig).context("Failed to read kubeconfig")?;

    match format {
        OutputFormat::Json => print_json(&contexts)?,
        OutputFormat::Text => {
            if contexts.is_empty() {
                print_warning("No contexts found in kubeconfig");
                return Ok(());
            }

            let rows: Vec<ContextRow> = contexts
                .into_iter()
                .map(|c| ContextRow {
                    active: active_marker(c.is_active),
                    name: c.display_name,
                    context: c.context_name,
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
