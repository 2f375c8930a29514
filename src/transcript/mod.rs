use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extractors::VideoId;

pub mod captions;
pub mod youtube;

pub use youtube::YoutubeTranscriptService;

/// Whether a track was authored by a person or generated by speech recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackOrigin {
    Generated,
    Manual,
}

impl TrackOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            TrackOrigin::Generated => "auto-generated",
            TrackOrigin::Manual => "manual",
        }
    }
}

impl fmt::Display for TrackOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One subtitle track offered for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Language code, e.g. `en` or `pt-BR`
    pub language_code: String,

    /// Display name of the language, e.g. `English (auto-generated)`
    pub language_name: String,

    /// Authored or auto-generated
    pub origin: TrackOrigin,

    /// Whether YouTube can translate this track into other languages
    pub translatable: bool,
}

impl TrackDescriptor {
    pub fn is_generated(&self) -> bool {
        self.origin == TrackOrigin::Generated
    }

    pub fn is_manually_created(&self) -> bool {
        self.origin == TrackOrigin::Manual
    }

    pub fn is_translatable(&self) -> bool {
        self.translatable
    }

    /// Selection label: `<display name> (<origin>) [<language code>]`
    pub fn label(&self) -> String {
        format!("{} ({}) [{}]", self.language_name, self.origin, self.language_code)
    }
}

/// A timed piece of subtitle text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSnippet {
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Retrieved subtitle track contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: VideoId,
    pub language_code: String,

    /// Origin of the track the service actually returned
    pub origin: TrackOrigin,
    pub snippets: Vec<TranscriptSnippet>,
}

impl Transcript {
    /// Snippet texts, one per line
    pub fn plain_text(&self) -> String {
        self.snippets
            .iter()
            .map(|snippet| snippet.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.iter().all(|snippet| snippet.text.trim().is_empty())
    }
}

/// Failures reported by the transcript service
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("The video {0} is no longer available")]
    VideoUnavailable(String),

    #[error("Subtitles are disabled for this video")]
    TranscriptsDisabled,

    #[error("No transcript was found for language {language}")]
    NoTranscriptFound { language: String },

    #[error("YouTube is blocking requests from this IP (too many requests or bot check)")]
    TooManyRequests,

    #[error("The video is unplayable: {0}")]
    Unplayable(String),

    #[error("The subtitle document is empty (no element found)")]
    EmptyTranscript,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse YouTube response: {0}")]
    Parse(String),
}

/// The external collaborator that owns subtitle data.
///
/// Every call is a single attempt; implementations do not retry or cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptService: Send + Sync {
    /// List the subtitle tracks available for a video
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<TrackDescriptor>, ServiceError>;

    /// Retrieve the contents of one track
    async fn fetch_track(
        &self,
        video_id: &VideoId,
        language_code: &str,
    ) -> Result<Transcript, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::extract_video_id;

    fn track(origin: TrackOrigin) -> TrackDescriptor {
        TrackDescriptor {
            language_code: "ko".to_string(),
            language_name: "Korean".to_string(),
            origin,
            translatable: true,
        }
    }

    #[test]
    fn test_label_format() {
        assert_eq!(track(TrackOrigin::Generated).label(), "Korean (auto-generated) [ko]");
        assert_eq!(track(TrackOrigin::Manual).label(), "Korean (manual) [ko]");
    }

    #[test]
    fn test_capability_flags() {
        let generated = track(TrackOrigin::Generated);
        assert!(generated.is_generated());
        assert!(!generated.is_manually_created());
        assert!(generated.is_translatable());
    }

    #[test]
    fn test_plain_text_joins_lines() {
        let transcript = Transcript {
            video_id: extract_video_id("https://youtu.be/abc").unwrap(),
            language_code: "en".to_string(),
            origin: TrackOrigin::Manual,
            snippets: vec![
                TranscriptSnippet { text: "hello".to_string(), start: 0.0, duration: 1.5 },
                TranscriptSnippet { text: "world".to_string(), start: 1.5, duration: 2.0 },
            ],
        };
        assert_eq!(transcript.plain_text(), "hello\nworld");
        assert!(!transcript.is_empty());
    }
}
