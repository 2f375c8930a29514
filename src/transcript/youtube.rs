use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::captions::{self, CaptionTrack, PlayerResponse};
use super::{ServiceError, TrackDescriptor, Transcript, TranscriptService};
use crate::config::ServiceConfig;
use crate::extractors::{youtube::watch_url, VideoId};

const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Transcript service backed by YouTube's public watch page and innertube player API
pub struct YoutubeTranscriptService {
    client: Client,
}

impl YoutubeTranscriptService {
    pub fn new(config: &ServiceConfig) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&config.accept_language)?);
        // Skips the EU consent interstitial on the watch page
        headers.insert(COOKIE, HeaderValue::from_static("CONSENT=YES+cb; SOCS=CAI"));

        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetch the watch page and ask the player API for the video's caption tracks
    async fn fetch_caption_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, ServiceError> {
        tracing::debug!("Fetching watch page for {}", video_id);

        let html = self
            .client
            .get(watch_url(video_id))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = captions::extract_api_key(&html)?;

        tracing::debug!("Querying innertube player for {}", video_id);

        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id.as_str(),
        });

        let response = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::TooManyRequests);
        }

        let player: PlayerResponse = response
            .error_for_status()?
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        captions::caption_tracks(video_id.as_str(), player)
    }
}

#[async_trait]
impl TranscriptService for YoutubeTranscriptService {
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<TrackDescriptor>, ServiceError> {
        let tracks = self.fetch_caption_tracks(video_id).await?;

        tracing::info!("Found {} subtitle track(s) for {}", tracks.len(), video_id);

        Ok(tracks.iter().map(CaptionTrack::descriptor).collect())
    }

    async fn fetch_track(
        &self,
        video_id: &VideoId,
        language_code: &str,
    ) -> Result<Transcript, ServiceError> {
        let tracks = self.fetch_caption_tracks(video_id).await?;

        let track = captions::find_track(&tracks, language_code).ok_or_else(|| {
            ServiceError::NoTranscriptFound {
                language: language_code.to_string(),
            }
        })?;

        tracing::info!(
            "Downloading {} ({}) subtitles for {}",
            track.language_code,
            track.origin(),
            video_id
        );

        let xml = self
            .client
            .get(track.timedtext_url())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let snippets = captions::parse_timedtext(&xml)?;

        Ok(Transcript {
            video_id: video_id.clone(),
            language_code: track.language_code.clone(),
            origin: track.origin(),
            snippets,
        })
    }
}
