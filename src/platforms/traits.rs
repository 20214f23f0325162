use serde::Serialize;

use crate::core::capabilities::{self, FormatOption};
use crate::models::media::VideoMetadata;
use crate::platforms::facebook::FacebookInfo;
use crate::platforms::tiktok::TikTokInfo;
use crate::platforms::Platform;

const LOG_URL_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgePosition {
    TopLeft,
    TopRight,
    BottomLeft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: String,
    pub position: BadgePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum PlatformInfo {
    TikTok(TikTokInfo),
    Facebook(FacebookInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisStatus {
    pub has_video: bool,
    pub has_preview: bool,
    pub has_thumbnail: bool,
    pub has_info: bool,
    pub multiple_qualities: bool,
    /// `both`/`no_watermark_only`/`watermark_only` for TikTok, the best
    /// resolved tier for Facebook, `unknown` otherwise.
    pub quality: String,
}

/// Everything a front end needs to render one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct VideoSummary {
    pub platform: Platform,
    pub platform_name: &'static str,
    pub icon: &'static str,
    pub border_color: &'static str,
    pub title: String,
    pub author: String,
    pub duration: String,
    pub thumbnail: Option<String>,
    pub formats: Vec<FormatOption>,
    pub format_status: Vec<FormatOption>,
    pub best_format: Option<&'static str>,
    pub badges: Vec<Badge>,
    pub info: PlatformInfo,
    pub status: AnalysisStatus,
    pub extraction: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct Activity<'a> {
    pub url: &'a str,
    pub quality: Option<&'a str>,
    pub success: Option<bool>,
    pub error: Option<&'a str>,
}

/// Canned hints selected when any needle occurs in an error message.
pub struct SuggestionRule {
    pub needles: &'static [&'static str],
    pub hints: &'static [&'static str],
}

pub fn match_suggestions(
    rules: &[SuggestionRule],
    fallback: &[&'static str],
    message: &str,
) -> Vec<&'static str> {
    let message = message.to_lowercase();
    let mut out: Vec<&'static str> = rules
        .iter()
        .filter(|r| r.needles.iter().any(|n| message.contains(n)))
        .flat_map(|r| r.hints.iter().copied())
        .collect();
    if out.is_empty() {
        out.extend_from_slice(fallback);
    }
    out
}

pub fn truncate_for_log(url: &str) -> String {
    let head: String = url.chars().take(LOG_URL_CHARS).collect();
    format!("{}...", head)
}

pub trait PlatformHandler: Send + Sync {
    fn platform(&self) -> Platform;
    fn display_name(&self) -> &'static str;
    fn icon(&self) -> &'static str;
    fn border_color(&self) -> &'static str;
    fn can_handle(&self, url: &str) -> bool;
    fn validate(&self, url: &str) -> bool;
    fn url_suggestions(&self) -> &'static [&'static str];
    fn preview_url<'a>(&self, meta: &'a VideoMetadata) -> Option<&'a str>;
    fn error_suggestions(&self, message: &str) -> Vec<&'static str>;
    fn info(&self, meta: &VideoMetadata, url: &str) -> PlatformInfo;
    fn badges(&self, meta: &VideoMetadata, url: &str) -> Vec<Badge>;
    fn analysis_status(&self, meta: &VideoMetadata) -> AnalysisStatus;

    fn summarize(&self, meta: &VideoMetadata, url: &str) -> VideoSummary {
        let platform = self.platform();
        let status = self.analysis_status(meta);
        VideoSummary {
            platform,
            platform_name: self.display_name(),
            icon: self.icon(),
            border_color: self.border_color(),
            title: meta.display_title(platform),
            author: meta.display_author(),
            duration: meta.display_duration().to_string(),
            thumbnail: meta.thumbnail().map(str::to_string),
            formats: capabilities::list_formats(platform, meta),
            format_status: capabilities::format_status(platform, meta),
            best_format: capabilities::best_available(platform, meta),
            badges: self.badges(meta, url),
            info: self.info(meta, url),
            extraction: if status.has_video { "success" } else { "failed" },
            status,
        }
    }

    fn log_activity(&self, action: &str, activity: &Activity<'_>) {
        tracing::info!(
            platform = self.display_name(),
            action,
            timestamp = %chrono::Utc::now().to_rfc3339(),
            url = %truncate_for_log(activity.url),
            quality = activity.quality.unwrap_or("-"),
            success = ?activity.success,
            error = activity.error.unwrap_or("-"),
            "[{}] {}",
            self.display_name(),
            action
        );
    }
}
