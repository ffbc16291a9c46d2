//! API client for communicating with the diagnosis agent

use anyhow::{Context, Result};
use diag_lib::{DiagnosisReport, DiagnosisWithContext};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// API client for the diagnosis agent
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        // Keep any path prefix when joining relative paths
        let mut base_url = Url::parse(base_url).context("Invalid API URL")?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Diagnose a pod through the agent
    pub async fn diagnose(&self, namespace: &str, pod: &str) -> Result<DiagnosisReport> {
        self.get(&format!("api/v1/diagnose/{}/{}", namespace, pod))
            .await
    }

    /// Diagnose a pod once and get the report with its follow-up context
    pub async fn diagnose_with_context(
        &self,
        namespace: &str,
        pod: &str,
    ) -> Result<DiagnosisWithContext> {
        self.get(&format!("api/v1/diagnose/{}/{}/context", namespace, pod))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diag_lib::{Evidence, FailureCategory};

    const OOM_REPORT: &str = r#"{
        "category": "out_of_memory_kill",
        "summary": "The pod was terminated due to excessive memory usage.",
        "likely_cause": "The application exceeded its assigned memory limit.",
        "evidence": {"type": "structured", "data": [
            {"key": "restart_count", "value": "3"},
            {"key": "logs", "value": ["allocating", "killed"]}
        ]},
        "recommendation": "Increase memory limits or optimize the application's memory consumption."
    }"#;

    #[tokio::test]
    async fn test_diagnose_parses_report() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/diagnose/payments/api-7d9f")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OOM_REPORT)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let report = client.diagnose("payments", "api-7d9f").await.unwrap();

        mock.assert_async().await;
        assert_eq!(report.category, FailureCategory::OutOfMemoryKill);
        assert!(matches!(report.evidence, Evidence::Structured(ref fields) if fields.len() == 2));
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/agent/api/v1/diagnose/default/web/context")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"report": {}, "context": {{"kube_context": "kind-dev",
                    "cluster_name": "Unknown", "namespace": "default", "pod_name": "web",
                    "summary": "s", "likely_cause": "c", "recommendation": "r"}}}}"#,
                OOM_REPORT
            ))
            .create_async()
            .await;

        let client = ApiClient::new(&format!("{}/agent", server.url())).unwrap();
        let bundle = client.diagnose_with_context("default", "web").await.unwrap();

        mock.assert_async().await;
        assert_eq!(bundle.report.category, FailureCategory::OutOfMemoryKill);
        assert_eq!(bundle.context.kube_context, "kind-dev");
        assert_eq!(bundle.context.pod_name, "web");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/diagnose/default/web")
            .with_status(503)
            .with_body("cluster unreachable")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.diagnose("default", "web").await.unwrap_err();

        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("cluster unreachable"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
