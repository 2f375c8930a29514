//! Per-interaction state and the handlers that drive it.
//!
//! A [`SessionController`] owns one [`InteractionState`] and reacts to the two user
//! triggers: "fetch track list" (given a URL) and "fetch track" (given one of the listed
//! tracks). Every call to the transcript service is a single attempt awaited to
//! completion, and every failure ends up as a [`SessionError`] with a display-ready
//! message rather than propagating.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extractors::{self, VideoId};
use crate::transcript::{ServiceError, TrackDescriptor, Transcript, TranscriptService};

pub mod export;

pub use export::SubtitleExport;

/// Failures surfaced to the user
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Please enter a YouTube URL")]
    MissingUrl,

    #[error("Please enter a valid YouTube URL")]
    InvalidUrl,

    #[error("Failed to fetch subtitle languages: {0}")]
    Listing(#[source] ServiceError),

    #[error("No subtitles are available for this video")]
    NoTracks,

    #[error("Fetch the track list before selecting a track")]
    NotReady,

    #[error("Failed to fetch subtitles: {0}")]
    Retrieval(#[source] ServiceError),

    #[error("No subtitles could be extracted for language {language}")]
    NoText { language: String },
}

impl SessionError {
    /// Banner text for the error, with friendlier wording for the cases users hit most
    pub fn user_message(&self) -> String {
        match self {
            SessionError::NoTracks | SessionError::Listing(ServiceError::TranscriptsDisabled) => {
                "This video does not provide subtitles (extraction may be blocked by YouTube policy or the video's settings)."
                    .to_string()
            }
            SessionError::Retrieval(ServiceError::EmptyTranscript) => {
                "Auto-generated subtitles for this video cannot be extracted under YouTube policy. Try another video."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Policy deciding which listed tracks are offered for selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackFilter {
    /// Offer auto-generated tracks
    pub include_generated: bool,

    /// Offer manually created tracks
    pub include_manual: bool,

    /// Only offer tracks YouTube can translate
    pub require_translatable: bool,
}

impl Default for TrackFilter {
    fn default() -> Self {
        Self {
            include_generated: true,
            include_manual: true,
            require_translatable: false,
        }
    }
}

impl TrackFilter {
    pub fn admits(&self, track: &TrackDescriptor) -> bool {
        let origin_ok = if track.is_generated() {
            self.include_generated
        } else {
            self.include_manual
        };
        origin_ok && (!self.require_translatable || track.is_translatable())
    }

    /// False when the policy rejects every possible track
    pub fn admits_anything(&self) -> bool {
        self.include_generated || self.include_manual
    }
}

impl fmt::Display for TrackFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.include_manual {
            parts.push("manual");
        }
        if self.include_generated {
            parts.push("auto-generated");
        }
        write!(f, "{}", parts.join(" + "))?;
        if self.require_translatable {
            write!(f, " (translatable only)")?;
        }
        Ok(())
    }
}

/// Mutable record of one session
#[derive(Debug, Default)]
pub struct InteractionState {
    video_id: Option<VideoId>,
    tracks: Vec<TrackDescriptor>,
    last_error: Option<SessionError>,
}

impl InteractionState {
    fn fail(&mut self, error: SessionError) {
        tracing::warn!("{}", error);
        self.video_id = None;
        self.tracks.clear();
        self.last_error = Some(error);
    }
}

/// Read-only view of the session, derived from [`InteractionState`]
#[derive(Debug)]
pub enum SessionState<'a> {
    Idle,
    Error(&'a SessionError),
    Ready {
        video_id: &'a VideoId,
        tracks: &'a [TrackDescriptor],
    },
}

/// Text retrieved for one track, ready for display and export
#[derive(Debug, Clone)]
pub struct RetrievedSubtitles {
    pub track: TrackDescriptor,
    pub transcript: Transcript,
    pub text: String,
}

impl RetrievedSubtitles {
    /// Plain-text download artifact: `subtitles_<id>_<lang>.txt`
    pub fn export(&self) -> SubtitleExport {
        SubtitleExport::plain_text(&self.transcript.video_id, &self.track.language_code, &self.text)
    }
}

/// Orchestrates the transcript service for one interactive session
pub struct SessionController<S> {
    service: S,
    filter: TrackFilter,
    state: InteractionState,
}

impl<S: TranscriptService> SessionController<S> {
    pub fn new(service: S) -> Self {
        Self::with_filter(service, TrackFilter::default())
    }

    pub fn with_filter(service: S, filter: TrackFilter) -> Self {
        Self {
            service,
            filter,
            state: InteractionState::default(),
        }
    }

    pub fn filter(&self) -> TrackFilter {
        self.filter
    }

    /// Current state of the session
    pub fn state(&self) -> SessionState<'_> {
        if let Some(error) = &self.state.last_error {
            return SessionState::Error(error);
        }
        match &self.state.video_id {
            Some(video_id) if !self.state.tracks.is_empty() => SessionState::Ready {
                video_id,
                tracks: &self.state.tracks,
            },
            _ => SessionState::Idle,
        }
    }

    pub fn video_id(&self) -> Option<&VideoId> {
        self.state.video_id.as_ref()
    }

    pub fn tracks(&self) -> &[TrackDescriptor] {
        &self.state.tracks
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.state.last_error.as_ref()
    }

    /// Labels of the selectable tracks, in listing order
    pub fn track_labels(&self) -> Vec<String> {
        self.state.tracks.iter().map(TrackDescriptor::label).collect()
    }

    /// "reset/refresh": discard identifier, tracks and error
    pub fn reset(&mut self) {
        self.state = InteractionState::default();
    }

    /// "fetch track list": start over from Idle and list the tracks of the URL's video
    pub async fn fetch_track_list(&mut self, url: &str) -> SessionState<'_> {
        self.reset();

        let url = url.trim();
        if url.is_empty() {
            self.state.fail(SessionError::MissingUrl);
            return self.state();
        }

        let Some(video_id) = extractors::extract_video_id(url) else {
            self.state.fail(SessionError::InvalidUrl);
            return self.state();
        };

        tracing::info!("Listing subtitle tracks for video {}", video_id);

        let listing = self.service.list_tracks(&video_id).await;
        match listing {
            Err(e) => self.state.fail(SessionError::Listing(e)),
            Ok(tracks) => {
                let listed = tracks.len();
                let tracks: Vec<_> = tracks
                    .into_iter()
                    .filter(|track| self.filter.admits(track))
                    .collect();

                if listed != tracks.len() {
                    tracing::debug!(
                        "Track filter ({}) kept {} of {} track(s)",
                        self.filter,
                        tracks.len(),
                        listed
                    );
                }

                if tracks.is_empty() {
                    self.state.fail(SessionError::NoTracks);
                } else {
                    self.state.video_id = Some(video_id);
                    self.state.tracks = tracks;
                }
            }
        }

        self.state()
    }

    /// Look up a listed track by language code, preferring manually created tracks
    pub fn find_track(&self, language_code: &str) -> Option<&TrackDescriptor> {
        self.state
            .tracks
            .iter()
            .filter(|track| track.language_code == language_code)
            .min_by_key(|track| track.is_generated())
    }

    /// "fetch track": retrieve the text of a listed track.
    ///
    /// Failures are returned for display only; the track listing is left untouched. The
    /// service resolves tracks by language code alone, so the returned
    /// [`RetrievedSubtitles::track`] describes the track it actually delivered, which can
    /// be the manual sibling of a selected auto-generated track.
    pub async fn fetch_track(&self, track: &TrackDescriptor) -> Result<RetrievedSubtitles, SessionError> {
        let SessionState::Ready { video_id, .. } = self.state() else {
            return Err(SessionError::NotReady);
        };

        tracing::info!("Fetching {} subtitles for video {}", track.language_code, video_id);

        let transcript = self
            .service
            .fetch_track(video_id, &track.language_code)
            .await
            .map_err(SessionError::Retrieval)?;

        if transcript.is_empty() {
            return Err(SessionError::NoText {
                language: track.language_code.clone(),
            });
        }

        let delivered = self
            .state
            .tracks
            .iter()
            .find(|t| t.language_code == transcript.language_code && t.origin == transcript.origin)
            .cloned()
            .unwrap_or_else(|| track.clone());

        if delivered.origin != track.origin {
            tracing::warn!(
                "Requested {} but the service returned {}",
                track.label(),
                delivered.label()
            );
        }

        Ok(RetrievedSubtitles {
            track: delivered,
            text: transcript.plain_text(),
            transcript,
        })
    }
}
