use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use engagement_engine::{AppCredentials, GraphSettings};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub app_id: String,
    pub app_secret: String,
    pub user_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub graph: GraphConfig,
    #[serde(default = "default_token_cache")]
    pub token_cache: PathBuf,
    #[serde(default = "default_tolerance_days")]
    pub expiry_tolerance_days: i64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Also log to this file when set.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_api_version() -> String {
    GraphSettings::default().api_version
}

fn default_base_url() -> String {
    GraphSettings::default().base_url
}

fn default_token_cache() -> PathBuf {
    PathBuf::from(".token.ron")
}

fn default_tolerance_days() -> i64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = ron::from_str(text)?;
        anyhow::ensure!(!config.graph.app_id.trim().is_empty(), "graph.app_id is empty");
        anyhow::ensure!(
            !config.graph.app_secret.trim().is_empty(),
            "graph.app_secret is empty"
        );
        anyhow::ensure!(
            !config.graph.user_token.trim().is_empty(),
            "graph.user_token is empty"
        );
        Ok(config)
    }

    /// Settings without an access token; the caller fills it in once one is obtained.
    pub fn graph_settings(&self) -> GraphSettings {
        GraphSettings {
            base_url: self.graph.base_url.clone(),
            api_version: self.graph.api_version.clone(),
            ..GraphSettings::default()
        }
    }

    pub fn credentials(&self) -> AppCredentials {
        AppCredentials {
            app_id: self.graph.app_id.clone(),
            app_secret: self.graph.app_secret.clone(),
            user_token: self.graph.user_token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = AppConfig::parse(
            r#"(graph: (app_id: "1", app_secret: "s", user_token: "u"))"#,
        )
        .unwrap();
        assert_eq!(config.graph.api_version, "v2.10");
        assert_eq!(config.graph.base_url, "https://graph.facebook.com");
        assert_eq!(config.token_cache, PathBuf::from(".token.ron"));
        assert_eq!(config.expiry_tolerance_days, 1);
        assert_eq!(config.log_file, None);
        assert_eq!(config.credentials().user_token, "u");
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::parse(
            r#"(
                graph: (
                    app_id: "1",
                    app_secret: "s",
                    user_token: "u",
                    api_version: "v3.0",
                ),
                token_cache: "cache/token.ron",
                expiry_tolerance_days: 3,
                log_level: "debug",
                log_file: Some("og_harvest.log"),
            )"#,
        )
        .unwrap();
        assert_eq!(config.graph_settings().api_version, "v3.0");
        assert_eq!(config.token_cache, PathBuf::from("cache/token.ron"));
        assert_eq!(config.log_file, Some(PathBuf::from("og_harvest.log")));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let err = AppConfig::parse(r#"(graph: (app_id: "", app_secret: "s", user_token: "u"))"#)
            .unwrap_err();
        assert!(err.to_string().contains("app_id"));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.ron");
        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.ron"));
    }
}
