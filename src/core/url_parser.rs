use serde::Serialize;

use crate::platforms::{facebook, tiktok, Platform};

#[derive(Debug, Clone, Serialize)]
pub struct ParsedUrl {
    pub platform: Platform,
    pub url: String,
    pub content_id: Option<String>,
    pub content_type: ParsedContentType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsedContentType {
    Video,
    Reel,
    Post,
    Watch,
    ShortLink,
    Profile,
    Unknown,
}

pub fn classify(url: &str) -> Platform {
    Platform::classify(url)
}

/// `false` for unknown platforms; never an error.
pub fn validate(url: &str, platform: Platform) -> bool {
    match platform {
        Platform::TikTok => tiktok::validate_url(url),
        Platform::Facebook => facebook::validate_url(url),
        Platform::Unknown => false,
    }
}

pub fn parse_url(url_str: &str) -> Option<ParsedUrl> {
    let url_str = url_str.trim();
    let platform = Platform::from_url(url_str)?;
    let parsed = url::Url::parse(url_str)
        .or_else(|_| url::Url::parse(&format!("https://{}", url_str)))
        .ok()?;
    let segments: Vec<&str> = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let (content_id, content_type) = match platform {
        Platform::TikTok => parse_tiktok(&parsed, &segments),
        Platform::Facebook => parse_facebook(&parsed, &segments),
        Platform::Unknown => (None, ParsedContentType::Unknown),
    };

    Some(ParsedUrl {
        platform,
        url: url_str.to_string(),
        content_id,
        content_type,
    })
}

fn parse_tiktok(parsed: &url::Url, segments: &[&str]) -> (Option<String>, ParsedContentType) {
    if tiktok::is_short_link(parsed.as_str()) {
        let code = segments.first().map(|s| s.to_string());
        return (code, ParsedContentType::ShortLink);
    }

    match segments {
        [user, "video", id, ..] if user.starts_with('@') => {
            (Some(id.to_string()), ParsedContentType::Video)
        }
        ["v", id, ..] => {
            let id = id.trim_end_matches(".html");
            (Some(id.to_string()), ParsedContentType::Video)
        }
        ["t", code, ..] => (Some(code.to_string()), ParsedContentType::ShortLink),
        [user] if user.starts_with('@') => (Some(user.to_string()), ParsedContentType::Profile),
        _ => (None, ParsedContentType::Unknown),
    }
}

fn parse_facebook(parsed: &url::Url, segments: &[&str]) -> (Option<String>, ParsedContentType) {
    let query_v = || {
        parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.to_string())
    };

    if parsed.host_str().is_some_and(|h| h.ends_with("fb.watch")) {
        let id = segments.first().map(|s| s.to_string());
        return (id, ParsedContentType::Watch);
    }

    match segments {
        ["reel", id, ..] => (Some(id.to_string()), ParsedContentType::Reel),
        ["share", "r", id, ..] => (Some(id.to_string()), ParsedContentType::Reel),
        ["share", "v", id, ..] => (Some(id.to_string()), ParsedContentType::Video),
        ["watch", ..] | ["video.php"] => (query_v(), ParsedContentType::Video),
        [.., "videos", id] => (Some(id.to_string()), ParsedContentType::Video),
        [.., "posts", id] => (Some(id.to_string()), ParsedContentType::Post),
        _ => (None, ParsedContentType::Unknown),
    }
}
