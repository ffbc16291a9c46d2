//! Context handed to a follow-up question-answering model
//!
//! The diagnosis itself never calls a language model. It only packages the
//! report and pod identity into a read-only context plus the system prompt
//! a front-end can send along with the operator's question.

use serde::{Deserialize, Serialize};

use crate::models::PodIdentity;
use crate::report::DiagnosisReport;

/// Placeholder for context fields the caller could not supply
const UNKNOWN: &str = "Unknown";

/// Read-only context for follow-up questions about a diagnosis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpContext {
    pub kube_context: String,
    pub cluster_name: String,
    pub namespace: String,
    pub pod_name: String,
    pub summary: String,
    pub likely_cause: String,
    pub recommendation: String,
}

impl FollowUpContext {
    /// Build the context from a finished report. `cluster_name` is optional
    /// because it is not part of the pod identity.
    pub fn from_report(
        identity: &PodIdentity,
        cluster_name: Option<&str>,
        report: &DiagnosisReport,
    ) -> Self {
        Self {
            kube_context: or_unknown(&identity.cluster_context),
            cluster_name: cluster_name.map(or_unknown).unwrap_or_else(|| UNKNOWN.to_string()),
            namespace: or_unknown(&identity.namespace),
            pod_name: or_unknown(&identity.pod_name),
            summary: report.summary.clone(),
            likely_cause: report.likely_cause.clone(),
            recommendation: report.recommendation.clone(),
        }
    }

    /// System prompt for the follow-up model
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a Kubernetes expert DevOps assistant.\n\
             \n\
             Here is the diagnostic analysis:\n\
             \n\
             Summary:\n{summary}\n\
             \n\
             Likely Cause:\n{cause}\n\
             \n\
             Recommendation:\n{recommendation}\n\
             \n\
             Cluster Context:\n\
             - Kube context: {kube_context}\n\
             - Cluster name: {cluster_name}\n\
             - Namespace: {namespace}\n\
             - Pod: {pod_name}\n\
             \n\
             Rules:\n\
             - Explain clearly and simply, as if helping a junior DevOps engineer.\n\
             - Use the cluster / namespace / pod context when relevant.\n\
             - Do NOT assume you can run kubectl; only reason from the data provided.\n\
             - Keep answers concise (around 150-200 words) unless the user asks for deep detail.\n\
             - Do not invent new root causes beyond what the evidence supports.\n\
             - Return the answer in markdown format.\n",
            summary = self.summary,
            cause = self.likely_cause,
            recommendation = self.recommendation,
            kube_context = self.kube_context,
            cluster_name = self.cluster_name,
            namespace = self.namespace,
            pod_name = self.pod_name,
        )
    }
}

/// A report together with the follow-up context built from the same run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisWithContext {
    pub report: DiagnosisReport,
    pub context: FollowUpContext,
}

impl DiagnosisWithContext {
    pub fn new(identity: &PodIdentity, cluster_name: Option<&str>, report: DiagnosisReport) -> Self {
        let context = FollowUpContext::from_report(identity, cluster_name, &report);
        Self { report, context }
    }
}

fn or_unknown(value: &str) -> String {
    if value.is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Evidence, FailureCategory};

    fn report() -> DiagnosisReport {
        DiagnosisReport {
            category: FailureCategory::OutOfMemoryKill,
            summary: "The pod was terminated due to excessive memory usage.".to_string(),
            likely_cause: "The application exceeded its assigned memory limit.".to_string(),
            evidence: Evidence::List(vec!["secret log line".to_string()]),
            recommendation: "Increase memory limits.".to_string(),
        }
    }

    #[test]
    fn test_context_from_report() {
        let identity = PodIdentity::new("gke_proj_zone_prod", "payments", "api-7d9f");
        let ctx = FollowUpContext::from_report(&identity, Some("prod"), &report());

        assert_eq!(ctx.kube_context, "gke_proj_zone_prod");
        assert_eq!(ctx.cluster_name, "prod");
        assert_eq!(ctx.pod_name, "api-7d9f");
        assert_eq!(ctx.recommendation, "Increase memory limits.");
    }

    #[test]
    fn test_missing_fields_become_unknown() {
        let identity = PodIdentity::new("", "payments", "api");
        let ctx = FollowUpContext::from_report(&identity, None, &report());

        assert_eq!(ctx.kube_context, "Unknown");
        assert_eq!(ctx.cluster_name, "Unknown");
    }

    #[test]
    fn test_system_prompt_carries_report_but_not_evidence() {
        let identity = PodIdentity::new("kind-dev", "default", "web");
        let prompt = FollowUpContext::from_report(&identity, None, &report()).system_prompt();

        assert!(prompt.contains("Summary:\nThe pod was terminated due to excessive memory usage."));
        assert!(prompt.contains("- Pod: web"));
        assert!(prompt.contains("- Kube context: kind-dev"));
        assert!(!prompt.contains("secret log line"));
    }

    #[test]
    fn test_diagnosis_with_context_shares_one_report() {
        let identity = PodIdentity::new("kind-dev", "default", "web");
        let bundle = DiagnosisWithContext::new(&identity, Some("dev"), report());

        assert_eq!(bundle.report.category, FailureCategory::OutOfMemoryKill);
        assert_eq!(bundle.context.summary, bundle.report.summary);
        assert_eq!(bundle.context.cluster_name, "dev");
    }
}
