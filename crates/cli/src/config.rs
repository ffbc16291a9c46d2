//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Namespace used when neither a flag nor the config file names one
pub const FALLBACK_NAMESPACE: &str = "default";

/// CLI configuration, read from `~/.config/podiag/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Diagnosis agent URL
    pub api_url: Option<String>,
    /// Default namespace
    pub default_namespace: Option<String>,
    /// Default kubeconfig context
    pub default_context: Option<String>,
}

impl Config {
    /// Load configuration from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("podiag").join("config.json"))
    }

    /// Flag value, then config file, then `"default"`
    pub fn namespace(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.default_namespace.clone())
            .unwrap_or_else(|| FALLBACK_NAMESPACE.to_string())
    }

    pub fn context(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.default_context.clone())
    }

    pub fn api_url(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.api_url.clone())
    }
}

/// Resolve the kubeconfig file from a `--kubeconfig`/`KUBECONFIG` value.
/// `KUBECONFIG` may hold a path list; the first entry is used.
pub fn kubeconfig_path(raw: Option<&str>) -> Option<PathBuf> {
    let raw = raw.filter(|r| !r.is_empty())?;
    std::env::split_paths(raw).find(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.namespace(None), "default");
    }

    #[test]
    fn test_file_values_fill_unset_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api_url": "http://agent:8080", "default_namespace": "payments", "default_context": "kind-dev"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.namespace(None), "payments");
        assert_eq!(config.namespace(Some("web".to_string())), "web");
        assert_eq!(config.context(None).as_deref(), Some("kind-dev"));
        assert_eq!(config.api_url(None).as_deref(), Some("http://agent:8080"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_kubeconfig_path_takes_first_entry() {
        assert_eq!(kubeconfig_path(None), None);
        assert_eq!(kubeconfig_path(Some("")), None);
        assert_eq!(
            kubeconfig_path(Some("/tmp/a.yaml")),
            Some(PathBuf::from("/tmp/a.yaml"))
        );

        let joined = std::env::join_paths(["/tmp/a.yaml", "/tmp/b.yaml"]).unwrap();
        assert_eq!(
            kubeconfig_path(joined.to_str()),
            Some(PathBuf::from("/tmp/a.yaml"))
        );
    }
}
