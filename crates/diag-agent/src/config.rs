//! Agent configuration

use anyhow::{Context, Result};
use serde::Deserialize;

/// Agent configuration, read from `AGENT_*` environment variables
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// API server port for diagnosis/health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Kubeconfig context to use; in-cluster/inferred config when unset
    #[serde(default)]
    pub kube_context: Option<String>,

    /// Human-friendly cluster name passed to follow-up contexts
    #[serde(default)]
    pub cluster_name: Option<String>,

    /// Log lines fetched per diagnosis
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: i64,

    /// Interval between API server reachability checks
    #[serde(default = "default_source_check_interval")]
    pub source_check_interval_secs: u64,
}

fn default_api_port() -> u16 {
    8080
}

fn default_log_tail_lines() -> i64 {
    diag_lib::DEFAULT_LOG_TAIL_LINES
}

fn default_source_check_interval() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            kube_context: None,
            cluster_name: None,
            log_tail_lines: default_log_tail_lines(),
            source_check_interval_secs: default_source_check_interval(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("AGENT"))
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to read agent configuration")?;

        let parsed: Self = config
            .try_deserialize()
            .context("invalid AGENT_* configuration")?;

        if parsed.log_tail_lines <= 0 {
            anyhow::bail!(
                "AGENT_LOG_TAIL_LINES must be positive, got {}",
                parsed.log_tail_lines
            );
        }

        Ok(parsed)
    }
}
