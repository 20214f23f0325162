//! Per-platform format tables.
//!
//! Each table is ordered by download priority: the first available entry is
//! the one [`best_available`] picks.

use serde::Serialize;

use crate::models::media::VideoMetadata;
use crate::platforms::Platform;

pub const AVAILABLE: &str = "✅ Available";
pub const NOT_AVAILABLE: &str = "❌ Not Available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub long_label: &'static str,
    pub icon: &'static str,
}

const TIKTOK_FORMATS: &[FormatSpec] = &[
    FormatSpec {
        key: "no_watermark",
        label: "No Watermark",
        long_label: "No Watermark Version",
        icon: "download",
    },
    FormatSpec {
        key: "watermark",
        label: "With Watermark",
        long_label: "Watermark Version",
        icon: "download",
    },
];

const FACEBOOK_FORMATS: &[FormatSpec] = &[
    FormatSpec {
        key: "hd",
        label: "HD Quality",
        long_label: "HD Quality (1080p+)",
        icon: "check-circle",
    },
    FormatSpec {
        key: "sd",
        label: "SD Quality",
        long_label: "SD Quality (720p)",
        icon: "eye",
    },
    FormatSpec {
        key: "auto",
        label: "Auto Quality",
        long_label: "Auto Quality (Best Available)",
        icon: "download",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatOption {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub available: bool,
    pub status: &'static str,
}

pub fn table(platform: Platform) -> &'static [FormatSpec] {
    match platform {
        Platform::TikTok => TIKTOK_FORMATS,
        Platform::Facebook => FACEBOOK_FORMATS,
        Platform::Unknown => &[],
    }
}

pub fn spec(platform: Platform, key: &str) -> Option<&'static FormatSpec> {
    table(platform).iter().find(|f| f.key == key)
}

fn status_text(available: bool) -> &'static str {
    if available {
        AVAILABLE
    } else {
        NOT_AVAILABLE
    }
}

/// Download buttons, one per table entry whatever the metadata says.
pub fn list_formats(platform: Platform, meta: &VideoMetadata) -> Vec<FormatOption> {
    table(platform)
        .iter()
        .map(|f| {
            let available = meta.is_available(f.key);
            FormatOption {
                key: f.key,
                label: f.label,
                icon: f.icon,
                available,
                status: status_text(available),
            }
        })
        .collect()
}

/// Status rows with the long labels.
pub fn format_status(platform: Platform, meta: &VideoMetadata) -> Vec<FormatOption> {
    table(platform)
        .iter()
        .map(|f| {
            let available = meta.is_available(f.key);
            FormatOption {
                key: f.key,
                label: f.long_label,
                icon: f.icon,
                available,
                status: status_text(available),
            }
        })
        .collect()
}

pub fn best_available(platform: Platform, meta: &VideoMetadata) -> Option<&'static str> {
    table(platform)
        .iter()
        .find(|f| meta.is_available(f.key))
        .map(|f| f.key)
}

/// False for keys outside the platform's table, even if the backend flagged them.
pub fn is_available(platform: Platform, meta: &VideoMetadata, key: &str) -> bool {
    spec(platform, key).is_some() && meta.is_available(key)
}
