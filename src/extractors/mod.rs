use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod youtube;

/// Identifier of a video on the hosting platform, as captured from its URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A recognised host together with the pattern capturing the identifier from its URLs
pub struct HostPattern {
    /// Substring that classifies a URL as belonging to this host
    pub host: &'static str,

    /// Human readable platform name
    pub platform: &'static str,

    /// Example URL shape, shown by `subex platforms`
    pub example: &'static str,

    capture: &'static Lazy<Regex>,
}

impl HostPattern {
    /// Check if this pattern's host appears in the URL
    pub fn matches_host(&self, url: &str) -> bool {
        url.contains(self.host)
    }

    /// Apply the capture pattern, returning the first group if it is non-empty
    pub fn capture(&self, url: &str) -> Option<VideoId> {
        self.capture
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|id| !id.is_empty())
            .map(|id| VideoId(id.to_string()))
    }
}

/// Recognised hosts, in classification order
pub static HOST_PATTERNS: [HostPattern; 2] = [
    HostPattern {
        host: "youtube.com",
        platform: "YouTube",
        example: "https://www.youtube.com/watch?v=<id>",
        capture: &youtube::WATCH_PARAM,
    },
    HostPattern {
        host: "youtu.be",
        platform: "YouTube (short links)",
        example: "https://youtu.be/<id>",
        capture: &youtube::SHORT_LINK,
    },
];

/// Extract the video identifier from a URL.
///
/// The first host pattern found in the URL decides which capture is applied. A URL whose
/// host is recognised but whose capture fails yields `None`, as does an unknown host.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    let pattern = HOST_PATTERNS
        .iter()
        .find(|pattern| pattern.matches_host(url))?;

    let id = pattern.capture(url);
    match &id {
        Some(id) => tracing::debug!("Extracted video id {} ({})", id, pattern.platform),
        None => tracing::debug!("URL matched {} but no identifier was captured", pattern.host),
    }
    id
}

/// Check if any recognised host appears in the URL
pub fn supports_url(url: &str) -> bool {
    HOST_PATTERNS.iter().any(|pattern| pattern.matches_host(url))
}
