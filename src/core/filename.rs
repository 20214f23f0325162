use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::platforms::Platform;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const FALLBACK_STEM: &str = "video";

/// Makes a single path component safe on every desktop filesystem.
pub fn sanitize_path_component(name: &str) -> String {
    let name: String = name.nfc().collect();
    let name = WS_RE.replace_all(name.trim(), " ");
    let name = name.trim_end_matches([' ', '.']);
    let cleaned = sanitize_filename::sanitize_with_options(
        name,
        sanitize_filename::Options {
            windows: true,
            truncate: true,
            replacement: "_",
        },
    );
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<platform>_<video id>_<format>.mp4`, used when the backend sends no name.
pub fn download_filename(platform: Platform, video_id: Option<&str>, format_key: &str) -> String {
    let id = video_id.filter(|s| !s.is_empty()).unwrap_or(FALLBACK_STEM);
    sanitize_path_component(&format!("{}_{}_{}.mp4", platform, id, format_key))
}

pub fn preview_filename(platform: Platform, video_id: Option<&str>) -> String {
    download_filename(platform, video_id, "preview")
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
