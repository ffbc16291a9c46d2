//! Pod diagnosis command

use anyhow::{Context, Result};
use diag_lib::observability::StructuredLogger;
use diag_lib::source::context_display_name;
use diag_lib::{Diagnoser, DiagnosisReport, FollowUpContext, PodIdentity};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::client::ApiClient;
use crate::output::{print_follow_up, print_info, print_json, print_report, print_warning, OutputFormat};

/// Where diagnoses run
pub enum Backend {
    /// Through a diagnosis agent
    Agent(ApiClient),
    /// In-process, against the cluster of a kubeconfig context
    Local { kubeconfig: Option<PathBuf> },
}

/// Arguments of `podiag diagnose` after defaults are resolved
#[derive(Debug, Clone)]
pub struct DiagnoseArgs {
    pub pod: String,
    pub namespace: String,
    pub context: Option<String>,
    pub follow_up: bool,
}

/// JSON output: the report, plus the follow-up context when requested
#[derive(Serialize)]
struct DiagnoseOutput<'a> {
    #[serde(flatten)]
    report: &'a DiagnosisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    follow_up: Option<&'a FollowUpContext>,
}

/// Diagnose one pod and print the report
pub async fn diagnose(backend: &Backend, args: &DiagnoseArgs, format: OutputFormat) -> Result<()> {
    let (report, follow_up, origin) = match backend {
        Backend::Agent(client) => {
            if args.context.is_some() && matches!(format, OutputFormat::Text) {
                print_warning("--context is ignored when diagnosing through an agent");
            }
            run_remote(client, args).await?
        }
        Backend::Local { kubeconfig } => run_local(kubeconfig.as_deref(), args).await?,
    };

    match format {
        OutputFormat::Json => print_json(&DiagnoseOutput {
            report: &report,
            follow_up: follow_up.as_ref(),
        })?,
        OutputFormat::Text => {
            print_report(&format!("{}/{}", args.namespace, args.pod), &report);
            if let Some(ctx) = &follow_up {
                print_follow_up(ctx);
            }
            print_info(&format!(
                "Diagnosed {} at {}",
                origin,
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
        }
    }

    Ok(())
}

async fn run_remote(
    client: &ApiClient,
    args: &DiagnoseArgs,
) -> Result<(DiagnosisReport, Option<FollowUpContext>, String)> {
    let origin = "through the agent".to_string();

    if args.follow_up {
        let bundle = client
            .diagnose_with_context(&args.namespace, &args.pod)
            .await
            .context("Diagnosis request to the agent failed")?;
        return Ok((bundle.report, Some(bundle.context), origin));
    }

    let report = client
        .diagnose(&args.namespace, &args.pod)
        .await
        .context("Diagnosis request to the agent failed")?;

    Ok((report, None, origin))
}

async fn run_local(
    kubeconfig: Option<&std::path::Path>,
    args: &DiagnoseArgs,
) -> Result<(DiagnosisReport, Option<FollowUpContext>, String)> {
    let source = super::connect(kubeconfig, args.context.as_deref()).await?;

    let context_name = source.context_name().to_string();
    debug!(context = %context_name, "Diagnosing locally");

    let identity = PodIdentity::new(context_name.clone(), &args.namespace, &args.pod);
    let diagnoser = Diagnoser::new(Arc::new(source)).with_logger(StructuredLogger::new("podiag"));
    let report = diagnoser.diagnose(&identity).await;

    let follow_up = args.follow_up.then(|| {
        FollowUpContext::from_report(&identity, Some(context_display_name(&context_name)), &report)
    });

    Ok((report, follow_up, format!("in context {}", context_name)))
}
