use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::platforms::Platform;

/// Video metadata as returned by `/api/video-info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub duration: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub available_formats: BTreeMap<String, bool>,
    #[serde(default, deserialize_with = "present_urls")]
    pub urls: BTreeMap<String, String>,
}

impl VideoMetadata {
    pub fn is_available(&self, key: &str) -> bool {
        self.available_formats.get(key).copied().unwrap_or(false)
    }

    pub fn url(&self, key: &str) -> Option<&str> {
        self.urls.get(key).map(String::as_str)
    }

    pub fn display_title(&self, platform: Platform) -> String {
        match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(t) => t.to_string(),
            None => match platform {
                Platform::TikTok => "TikTok Video".to_string(),
                Platform::Facebook => "Facebook Video".to_string(),
                Platform::Unknown => "Video".to_string(),
            },
        }
    }

    pub fn display_author(&self) -> String {
        match self.author.as_deref().filter(|a| !a.is_empty()) {
            Some(a) => format!("@{}", a),
            None => "@Unknown".to_string(),
        }
    }

    pub fn display_duration(&self) -> &str {
        self.duration
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("0:00")
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref().filter(|t| !t.is_empty())
    }

    pub fn has_info(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
            && self.author.as_deref().is_some_and(|a| !a.is_empty())
    }
}

// The backend sends `null` for formats it could not resolve.
fn present_urls<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| v.filter(|u| !u.is_empty()).map(|u| (k, u)))
        .collect())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoInfoRequest {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfoResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub data: Option<VideoMetadata>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /api/download`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_watermark: Option<bool>,
}

impl DownloadRequest {
    pub fn new(url: &str, platform: Platform, format_key: &str) -> Self {
        let no_watermark = match platform {
            Platform::TikTok => Some(format_key == "no_watermark"),
            _ => None,
        };
        Self {
            url: url.trim().to_string(),
            quality: format_key.to_string(),
            no_watermark,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyRequest {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub supported_platforms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    pub file_path: PathBuf,
    pub file_size_bytes: u64,
}
