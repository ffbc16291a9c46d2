//! CLI integration tests

use std::process::Command;

fn podiag(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "podiag-cli", "--"])
        .args(args)
        .env_remove("PODIAG_API_URL")
        .env_remove("PODIAG_NAMESPACE")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = podiag(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Pod Diagnostics"), "Should show app name");
    assert!(stdout.contains("diagnose"), "Should show diagnose command");
    assert!(stdout.contains("contexts"), "Should show contexts command");
    assert!(stdout.contains("namespaces"), "Should show namespaces command");
    assert!(stdout.contains("pods"), "Should show pods command");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = podiag(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("podiag"), "Should show binary name");
}

/// Test diagnose subcommand help
#[test]
fn test_diagnose_help() {
    let output = podiag(&["diagnose", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Diagnose help should succeed");
    assert!(stdout.contains("--namespace"), "Should show namespace option");
    assert!(stdout.contains("--context"), "Should show context option");
    assert!(stdout.contains("--follow-up"), "Should show follow-up option");
}

/// Test namespaces subcommand help
#[test]
fn test_namespaces_help() {
    let output = podiag(&["namespaces", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Namespaces help should succeed");
    assert!(stdout.contains("--context"), "Should show context option");
}

/// Test pods subcommand help
#[test]
fn test_pods_help() {
    let output = podiag(&["pods", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Pods help should succeed");
    assert!(stdout.contains("--namespace"), "Should show namespace option");
    assert!(stdout.contains("-n"), "Should show short namespace flag");
    assert!(stdout.contains("--context"), "Should show context option");
}

/// Test that diagnose requires a pod name
#[test]
fn test_diagnose_requires_pod() {
    let output = podiag(&["diagnose"]);

    assert!(!output.status.success(), "Diagnose without a pod should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<POD>"), "Should name the missing argument");
}

/// Test that an unknown format is rejected
#[test]
fn test_invalid_format_rejected() {
    let output = podiag(&["--format", "yaml", "contexts"]);

    assert!(!output.status.success(), "Unknown format should fail");
}

/// Test listing contexts from an explicit kubeconfig
#[test]
fn test_contexts_json_from_kubeconfig() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");
    std::fs::write(
        &path,
        r#"apiVersion: v1
kind: Config
current-context: kind-dev
clusters: []
users: []
contexts:
- name: gke_proj_zone_prod
  context:
    cluster: prod
    user: prod
- name: kind-dev
  context:
    cluster: dev
    user: dev
"#,
    )
    .unwrap();

    let output = podiag(&[
        "--kubeconfig",
        path.to_str().unwrap(),
        "--format",
        "json",
        "contexts",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Contexts should succeed: {}", stdout);
    let contexts: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(contexts[0]["display_name"], "prod");
    assert_eq!(contexts[1]["is_active"], true);
}
