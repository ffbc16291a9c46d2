//! Pod Diagnostics CLI
//!
//! Diagnoses failing Kubernetes pods, either in-process through a
//! kubeconfig context or through a running diagnosis agent.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{contexts, diagnose, namespaces, pods};
use tracing_subscriber::EnvFilter;

/// Pod Diagnostics CLI
#[derive(Parser)]
#[command(name = "podiag")]
#[command(author, version, about = "CLI for Pod Diagnostics", long_about = None)]
pub struct Cli {
    /// Diagnosis agent URL; diagnoses run locally when unset
    #[arg(long, env = "PODIAG_API_URL")]
    pub api_url: Option<String>,

    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "text")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Diagnose why a pod is failing
    Diagnose {
        /// Pod name
        pod: String,

        /// Namespace of the pod
        #[arg(long, short, env = "PODIAG_NAMESPACE")]
        namespace: Option<String>,

        /// Kubeconfig context to use
        #[arg(long)]
        context: Option<String>,

        /// Also print the context for follow-up questions
        #[arg(long)]
        follow_up: bool,
    },

    /// List kubeconfig contexts
    Contexts,

    /// List namespaces that hold pods
    Namespaces {
        /// Kubeconfig context to use
        #[arg(long)]
        context: Option<String>,
    },

    /// List the pods of a namespace
    Pods {
        /// Namespace to list
        #[arg(long, short, env = "PODIAG_NAMESPACE")]
        namespace: Option<String>,

        /// Kubeconfig context to use
        #[arg(long)]
        context: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("warn,diag_lib=debug,podiag=debug")),
            )
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    let file_config = config::Config::load()?;
    let kubeconfig = config::kubeconfig_path(cli.kubeconfig.as_deref());

    match cli.command {
        Commands::Diagnose {
            pod,
            namespace,
            context,
            follow_up,
        } => {
            let backend = match file_config.api_url(cli.api_url) {
                Some(url) => diagnose::Backend::Agent(client::ApiClient::new(&url)?),
                None => diagnose::Backend::Local { kubeconfig },
            };
            let args = diagnose::DiagnoseArgs {
                pod,
                namespace: file_config.namespace(namespace),
                context: file_config.context(context),
                follow_up,
            };

            diagnose::diagnose(&backend, &args, cli.format).await?;
        }
        Commands::Contexts => {
            contexts::list_contexts(kubeconfig.as_deref(), cli.format)?;
        }
        Commands::Namespaces { context } => {
            let context = file_config.context(context);
            namespaces::list_namespaces(kubeconfig.as_deref(), context.as_deref(), cli.format)
                .await?;
        }
        Commands::Pods { namespace, context } => {
            let namespace = file_config.namespace(namespace);
            let context = file_config.context(context);
            pods::list_pods(kubeconfig.as_deref(), context.as_deref(), &namespace, cli.format)
                .await?;
        }
    }

    Ok(())
}
