use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::media::VideoMetadata;
use crate::platforms::traits::{
    match_suggestions, AnalysisStatus, Badge, BadgePosition, PlatformHandler, PlatformInfo,
    SuggestionRule,
};
use crate::platforms::Platform;

const DEFAULT_ASPECT_RATIO: &str = "0.56";

static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"tiktok\.com/@[\w.-]+/video/\d+",
        r"vm\.tiktok\.com/\w+",
        r"vt\.tiktok\.com/\w+",
        r"m\.tiktok\.com/v/\d+",
        r"tiktok\.com/t/\w+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const URL_SUGGESTIONS: &[&str] = &[
    "https://www.tiktok.com/@username/video/...",
    "https://vm.tiktok.com/...",
    "https://m.tiktok.com/v/...",
    "https://vt.tiktok.com/...",
];

const ERROR_RULES: &[SuggestionRule] = &[
    SuggestionRule {
        needles: &["private", "login"],
        hints: &[
            "The video might be private. Try with a public video.",
            "Make sure the video is accessible without logging in.",
        ],
    },
    SuggestionRule {
        needles: &["video not found", "404"],
        hints: &[
            "Check if the TikTok URL is correct and the video still exists.",
            "The video might have been deleted by its author.",
        ],
    },
    SuggestionRule {
        needles: &["geographic", "region"],
        hints: &["The video might be geo-restricted in your region."],
    },
];

const FALLBACK_HINTS: &[&str] = &[
    "Try again in a few moments.",
    "Check if the TikTok URL is valid and public.",
];

pub fn validate_url(url: &str) -> bool {
    URL_PATTERNS.iter().any(|re| re.is_match(url))
}

pub fn is_short_link(url: &str) -> bool {
    url.contains("vm.tiktok.com") || url.contains("vt.tiktok.com")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TikTokInfo {
    pub width: u32,
    pub height: u32,
    pub dimensions: String,
    pub aspect_ratio: String,
    pub landscape: bool,
    pub has_watermark: bool,
    pub has_no_watermark: bool,
}

pub struct TikTokHandler;

impl TikTokHandler {
    pub fn new() -> Self {
        Self
    }

    fn tiktok_info(meta: &VideoMetadata) -> TikTokInfo {
        let width = meta.width.unwrap_or(0);
        let height = meta.height.unwrap_or(0);
        let (aspect_ratio, landscape) = if width > 0 && height > 0 {
            let ratio = width as f64 / height as f64;
            (format!("{:.2}", ratio), ratio > 1.0)
        } else {
            (DEFAULT_ASPECT_RATIO.to_string(), false)
        };

        TikTokInfo {
            width,
            height,
            dimensions: format!("{}x{}", width, height),
            aspect_ratio,
            landscape,
            has_watermark: meta.url("watermark").is_some(),
            has_no_watermark: meta.url("no_watermark").is_some(),
        }
    }
}

impl Default for TikTokHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformHandler for TikTokHandler {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn display_name(&self) -> &'static str {
        "TikTok"
    }

    fn icon(&self) -> &'static str {
        "🎵"
    }

    fn border_color(&self) -> &'static str {
        "#000000"
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("tiktok.com")
    }

    fn validate(&self, url: &str) -> bool {
        validate_url(url)
    }

    fn url_suggestions(&self) -> &'static [&'static str] {
        URL_SUGGESTIONS
    }

    fn preview_url<'a>(&self, meta: &'a VideoMetadata) -> Option<&'a str> {
        meta.url("preview").or_else(|| meta.url("watermark"))
    }

    fn error_suggestions(&self, message: &str) -> Vec<&'static str> {
        match_suggestions(ERROR_RULES, FALLBACK_HINTS, message)
    }

    fn info(&self, meta: &VideoMetadata, _url: &str) -> PlatformInfo {
        PlatformInfo::TikTok(Self::tiktok_info(meta))
    }

    fn badges(&self, _meta: &VideoMetadata, _url: &str) -> Vec<Badge> {
        vec![Badge {
            text: "TikTok".to_string(),
            position: BadgePosition::TopRight,
        }]
    }

    fn analysis_status(&self, meta: &VideoMetadata) -> AnalysisStatus {
        let wm = meta.url("watermark").is_some();
        let no_wm = meta.url("no_watermark").is_some();
        let quality = match (no_wm, wm) {
            (true, true) => "both",
            (true, false) => "no_watermark_only",
            (false, true) => "watermark_only",
            (false, false) => "unknown",
        };

        AnalysisStatus {
            has_video: wm || no_wm,
            has_preview: meta.url("preview").is_some(),
            has_thumbnail: meta.thumbnail().is_some(),
            has_info: meta.has_info(),
            multiple_qualities: wm && no_wm,
            quality: quality.to_string(),
        }
    }
}
