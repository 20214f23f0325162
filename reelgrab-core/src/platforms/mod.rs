use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static FACEBOOK_HOSTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"facebook\.com", r"fb\.watch"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Platform a pasted URL belongs to. Derived from the URL string only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    TikTok,
    Facebook,
    Unknown,
}

impl Platform {
    pub const SUPPORTED: [Platform; 2] = [Platform::TikTok, Platform::Facebook];

    /// TikTok is checked first, so a URL mentioning both hosts is TikTok.
    pub fn classify(url: &str) -> Self {
        if url.contains("tiktok.com") {
            return Platform::TikTok;
        }
        if FACEBOOK_HOSTS.iter().any(|re| re.is_match(url)) {
            return Platform::Facebook;
        }
        Platform::Unknown
    }

    pub fn from_url(url: &str) -> Option<Self> {
        match Self::classify(url) {
            Platform::Unknown => None,
            p => Some(p),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Unknown => "unknown",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Platform::Unknown)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiktok" => Ok(Platform::TikTok),
            "facebook" => Ok(Platform::Facebook),
            "unknown" => Ok(Platform::Unknown),
            other => Err(anyhow::anyhow!("unknown platform tag: {}", other)),
        }
    }
}
