use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fs_paths::{AppPaths, DesktopPaths};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub proxy: ProxySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Format key tried before the platform's best available one.
    #[serde(default)]
    pub preferred_format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_preview_timeout_secs")]
    pub preview_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxySettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_proxy_type")]
    pub proxy_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_proxy_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_schema_version() -> u32 {
    1
}

pub fn default_api_base() -> String {
    "http://localhost:5000/api".into()
}

fn default_output_dir() -> PathBuf {
    DesktopPaths.downloads_dir()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_preview_timeout_secs() -> u64 {
    15
}

fn default_proxy_type() -> String {
    "http".into()
}

fn default_proxy_port() -> u16 {
    8080
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            preferred_format: None,
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            preview_timeout_secs: default_preview_timeout_secs(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            api_base: default_api_base(),
            download: DownloadSettings::default(),
            network: NetworkSettings::default(),
            proxy: ProxySettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let s: AppSettings =
            serde_json::from_str(r#"{"schema_version": 1, "network": {"preview_timeout_secs": 5}}"#)
                .unwrap();
        assert_eq!(s.api_base, "http://localhost:5000/api");
        assert_eq!(s.network.preview_timeout_secs, 5);
        assert_eq!(s.network.request_timeout_secs, 30);
        assert!(!s.proxy.enabled);
        assert!(s.download.preferred_format.is_none());
    }

    #[test]
    fn schema_version_is_optional() {
        let s: AppSettings =
            serde_json::from_str(r#"{"api_base": "http://10.0.0.9:8000/api"}"#).unwrap();
        assert_eq!(s.schema_version, 1);
        assert_eq!(s.api_base, "http://10.0.0.9:8000/api");
    }

    #[test]
    fn proxy_defaults_when_present() {
        let s: AppSettings = serde_json::from_str(
            r#"{"schema_version": 1, "proxy": {"enabled": true, "host": "10.0.0.1"}}"#,
        )
        .unwrap();
        assert_eq!(s.proxy.proxy_type, "http");
        assert_eq!(s.proxy.port, 8080);
    }
}
