use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::media::VideoMetadata;
use crate::platforms::traits::{
    match_suggestions, AnalysisStatus, Badge, BadgePosition, PlatformHandler, PlatformInfo,
    SuggestionRule,
};
use crate::platforms::Platform;

const QUALITY_TIERS: [&str; 3] = ["hd", "sd", "auto"];

static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"facebook\.com/.*/videos/\d+",
        r"facebook\.com/watch/\?v=\d+",
        r"facebook\.com/reel/\d+",
        r"facebook\.com/.*/posts/\d+",
        r"facebook\.com/share/v/[\w-]+",
        r"facebook\.com/share/r/[\w-]+",
        r"fb\.watch/[\w-]+",
        r"facebook\.com/video\.php\?v=\d+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const URL_SUGGESTIONS: &[&str] = &[
    "https://www.facebook.com/username/videos/...",
    "https://www.facebook.com/watch/?v=...",
    "https://www.facebook.com/reel/...",
    "https://fb.watch/...",
    "https://www.facebook.com/share/v/...",
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
        needles: &["reel"],
        hints: &[
            "For Facebook Reels, try using the direct reel URL.",
            "Some reels might have restricted download access.",
        ],
    },
    SuggestionRule {
        needles: &["video not found", "404"],
        hints: &[
            "Check if the video URL is correct and still exists.",
            "The video might have been deleted or moved.",
        ],
    },
    SuggestionRule {
        needles: &["geographic", "region"],
        hints: &["The video might be geo-restricted in your region."],
    },
];

const FALLBACK_HINTS: &[&str] = &[
    "Try refreshing the page and trying again.",
    "Check if the Facebook URL is valid and public.",
];

pub fn validate_url(url: &str) -> bool {
    URL_PATTERNS.iter().any(|re| re.is_match(url))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacebookContentType {
    Reel,
    Video,
    Post,
    Watch,
    Unknown,
}

impl FacebookContentType {
    pub fn detect(url: &str) -> Self {
        if url.contains("/reel/") || url.contains("/share/r/") {
            Self::Reel
        } else if url.contains("/watch/") || url.contains("/videos/") {
            Self::Video
        } else if url.contains("/posts/") {
            Self::Post
        } else if url.contains("fb.watch") {
            Self::Watch
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reel => "reel",
            Self::Video => "video",
            Self::Post => "post",
            Self::Watch => "watch",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacebookInfo {
    pub content_type: FacebookContentType,
    pub is_reel: bool,
    pub is_video: bool,
    pub has_hd: bool,
    pub has_sd: bool,
    pub has_auto: bool,
    pub quality_count: usize,
    /// Rough size of the best resolved tier.
    pub estimated_size: &'static str,
}

pub fn estimate_download_size(key: &str) -> &'static str {
    match key {
        "hd" => "50-150 MB",
        "sd" => "20-80 MB",
        "auto" => "10-100 MB",
        _ => "Unknown",
    }
}

/// Best tier that resolved to a URL, which can differ from the advertised flags.
pub fn optimal_quality(meta: &VideoMetadata) -> Option<&'static str> {
    QUALITY_TIERS.into_iter().find(|k| meta.url(k).is_some())
}

pub struct FacebookHandler;

impl FacebookHandler {
    pub fn new() -> Self {
        Self
    }

    fn facebook_info(meta: &VideoMetadata, url: &str) -> FacebookInfo {
        let content_type = FacebookContentType::detect(url);
        FacebookInfo {
            content_type,
            is_reel: content_type == FacebookContentType::Reel,
            is_video: content_type == FacebookContentType::Video,
            has_hd: meta.url("hd").is_some(),
            has_sd: meta.url("sd").is_some(),
            has_auto: meta.url("auto").is_some(),
            quality_count: Self::quality_count(meta),
            estimated_size: estimate_download_size(optimal_quality(meta).unwrap_or_default()),
        }
    }

    fn quality_count(meta: &VideoMetadata) -> usize {
        QUALITY_TIERS
            .iter()
            .filter(|k| meta.url(k).is_some())
            .count()
    }
}

impl Default for FacebookHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformHandler for FacebookHandler {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn display_name(&self) -> &'static str {
        "Facebook"
    }

    fn icon(&self) -> &'static str {
        "👥"
    }

    fn border_color(&self) -> &'static str {
        "#1877f2"
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("facebook.com") || url.contains("fb.watch")
    }

    fn validate(&self, url: &str) -> bool {
        validate_url(url)
    }

    fn url_suggestions(&self) -> &'static [&'static str] {
        URL_SUGGESTIONS
    }

    fn preview_url<'a>(&self, meta: &'a VideoMetadata) -> Option<&'a str> {
        meta.url("preview").or_else(|| meta.url("auto"))
    }

    fn error_suggestions(&self, message: &str) -> Vec<&'static str> {
        match_suggestions(ERROR_RULES, FALLBACK_HINTS, message)
    }

    fn info(&self, meta: &VideoMetadata, url: &str) -> PlatformInfo {
        PlatformInfo::Facebook(Self::facebook_info(meta, url))
    }

    fn badges(&self, meta: &VideoMetadata, url: &str) -> Vec<Badge> {
        let info = Self::facebook_info(meta, url);
        let plural = if info.quality_count == 1 { "" } else { "s" };
        let mut badges = vec![
            Badge {
                text: info.content_type.as_str().to_uppercase(),
                position: BadgePosition::TopLeft,
            },
            Badge {
                text: format!("{} Quality{}", info.quality_count, plural),
                position: BadgePosition::TopRight,
            },
        ];
        if info.is_reel {
            badges.push(Badge {
                text: "🎬 Reel".to_string(),
                position: BadgePosition::BottomLeft,
            });
        }
        badges
    }

    fn analysis_status(&self, meta: &VideoMetadata) -> AnalysisStatus {
        let count = Self::quality_count(meta);
        AnalysisStatus {
            has_video: count > 0,
            has_preview: meta.url("preview").is_some(),
            has_thumbnail: meta.thumbnail().is_some(),
            has_info: meta.has_info(),
            multiple_qualities: count > 1,
            quality: optimal_quality(meta).unwrap_or("unknown").to_string(),
        }
    }
}
