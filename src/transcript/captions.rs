use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;

use super::{ServiceError, TrackDescriptor, TrackOrigin, TranscriptSnippet};

static API_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("static regex"));

static TEXT_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)"#).expect("static regex")
});

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("static regex"));

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("static regex"));

/// Innertube `player` response, reduced to the fields we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub playability_status: Option<PlayabilityStatus>,
    pub captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
pub struct PlayabilityStatus {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captions {
    pub player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracklistRenderer {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub name: Option<TrackName>,
    pub language_code: String,
    pub kind: Option<String>,
    #[serde(default)]
    pub is_translatable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackName {
    pub simple_text: Option<String>,
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextRun {
    pub text: String,
}

impl CaptionTrack {
    pub fn origin(&self) -> TrackOrigin {
        if self.kind.as_deref() == Some("asr") {
            TrackOrigin::Generated
        } else {
            TrackOrigin::Manual
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .as_ref()
            .and_then(|name| {
                name.runs
                    .first()
                    .map(|run| run.text.clone())
                    .or_else(|| name.simple_text.clone())
            })
            .unwrap_or_else(|| self.language_code.clone())
    }

    /// Timed-text URL in the default XML format
    pub fn timedtext_url(&self) -> String {
        self.base_url.replace("&fmt=srv3", "")
    }

    pub fn descriptor(&self) -> TrackDescriptor {
        TrackDescriptor {
            language_code: self.language_code.clone(),
            language_name: self.display_name(),
            origin: self.origin(),
            translatable: self.is_translatable,
        }
    }
}

/// Pull the innertube API key out of a watch page
pub fn extract_api_key(html: &str) -> Result<String, ServiceError> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(ServiceError::TooManyRequests);
    }

    API_KEY
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ServiceError::Parse("innertube API key not found in watch page".to_string()))
}

/// Check playability and return the caption tracks of a player response
pub fn caption_tracks(video_id: &str, response: PlayerResponse) -> Result<Vec<CaptionTrack>, ServiceError> {
    if let Some(status) = &response.playability_status {
        let reason = status.reason.clone().unwrap_or_default();
        match status.status.as_str() {
            "OK" => {}
            "LOGIN_REQUIRED" if reason.contains("not a bot") => {
                return Err(ServiceError::TooManyRequests);
            }
            "ERROR" if reason.contains("unavailable") => {
                return Err(ServiceError::VideoUnavailable(video_id.to_string()));
            }
            _ => return Err(ServiceError::Unplayable(reason)),
        }
    }

    let tracks = response
        .captions
        .and_then(|captions| captions.player_captions_tracklist_renderer)
        .map(|renderer| renderer.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(ServiceError::TranscriptsDisabled);
    }

    Ok(tracks)
}

/// Pick the track for a language, preferring manually created tracks
pub fn find_track<'a>(tracks: &'a [CaptionTrack], language_code: &str) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .filter(|track| track.language_code == language_code)
        .min_by_key(|track| track.origin() == TrackOrigin::Generated)
}

/// Parse a timed-text XML document into snippets
pub fn parse_timedtext(xml: &str) -> Result<Vec<TranscriptSnippet>, ServiceError> {
    if xml.trim().is_empty() {
        return Err(ServiceError::EmptyTranscript);
    }

    let snippets = TEXT_ELEMENT
        .captures_iter(xml)
        .filter_map(|caps| {
            let attributes = caps.get(1)?.as_str();
            // self-closed elements carry no text
            let content = caps.get(2)?;
            let start = attribute(attributes, "start")?;
            let duration = attribute(attributes, "dur").unwrap_or(0.0);
            let text = clean_text(content.as_str());
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSnippet { text, start, duration })
        })
        .collect();

    Ok(snippets)
}

fn attribute(attributes: &str, name: &str) -> Option<f64> {
    ATTRIBUTE
        .captures_iter(attributes)
        .find(|caps| &caps[1] == name)
        .and_then(|caps| caps[2].parse().ok())
}

/// Decode entities (twice, since YouTube double-escapes markup) and strip inline tags
fn clean_text(raw: &str) -> String {
    let decoded = decode_entities(&decode_entities(raw));
    MARKUP.replace_all(&decoded, "").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => entity[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_JSON: &str = r#"{
        "playabilityStatus": {"status": "OK"},
        "captions": {
            "playerCaptionsTracklistRenderer": {
                "captionTracks": [
                    {
                        "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=en&fmt=srv3",
                        "name": {"runs": [{"text": "English"}]},
                        "languageCode": "en",
                        "isTranslatable": true
                    },
                    {
                        "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=en&kind=asr",
                        "name": {"simpleText": "English (auto-generated)"},
                        "languageCode": "en",
                        "kind": "asr"
                    }
                ]
            }
        }
    }"#;

    fn player(json: &str) -> PlayerResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSy-test_KEY","X":1})</script>"#;
        assert_eq!(extract_api_key(html).unwrap(), "AIzaSy-test_KEY");
    }

    #[test]
    fn test_extract_api_key_recaptcha() {
        let html = r#"<div class="g-recaptcha"></div>"#;
        assert!(matches!(extract_api_key(html), Err(ServiceError::TooManyRequests)));
    }

    #[test]
    fn test_extract_api_key_missing() {
        assert!(matches!(extract_api_key("<html></html>"), Err(ServiceError::Parse(_))));
    }

    #[test]
    fn test_caption_tracks_to_descriptors() {
        let tracks = caption_tracks("abc", player(PLAYER_JSON)).unwrap();
        let descriptors: Vec<_> = tracks.iter().map(CaptionTrack::descriptor).collect();

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].label(), "English (manual) [en]");
        assert!(descriptors[0].translatable);
        assert_eq!(descriptors[1].label(), "English (auto-generated) (auto-generated) [en]");
        assert!(!descriptors[1].translatable);
        assert_eq!(tracks[0].timedtext_url(), "https://www.youtube.com/api/timedtext?v=abc&lang=en");
    }

    #[test]
    fn test_find_track_prefers_manual() {
        let tracks = caption_tracks("abc", player(PLAYER_JSON)).unwrap();
        let found = find_track(&tracks, "en").unwrap();
        assert_eq!(found.origin(), TrackOrigin::Manual);
        assert!(find_track(&tracks, "de").is_none());
    }

    #[test]
    fn test_missing_captions_means_disabled() {
        let response = player(r#"{"playabilityStatus": {"status": "OK"}}"#);
        assert!(matches!(caption_tracks("abc", response), Err(ServiceError::TranscriptsDisabled)));
    }

    #[test]
    fn test_playability_errors() {
        let unavailable = player(
            r#"{"playabilityStatus": {"status": "ERROR", "reason": "This video is unavailable"}}"#,
        );
        assert!(matches!(
            caption_tracks("abc", unavailable),
            Err(ServiceError::VideoUnavailable(id)) if id == "abc"
        ));

        let bot_check = player(
            r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED", "reason": "Sign in to confirm you're not a bot"}}"#,
        );
        assert!(matches!(caption_tracks("abc", bot_check), Err(ServiceError::TooManyRequests)));

        let private = player(
            r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED", "reason": "This video is private"}}"#,
        );
        assert!(matches!(
            caption_tracks("abc", private),
            Err(ServiceError::Unplayable(reason)) if reason == "This video is private"
        ));
    }

    #[test]
    fn test_parse_timedtext() {
        let xml = r##"<?xml version="1.0" encoding="utf-8" ?><transcript>
            <text start="0.5" dur="1.25">hello &amp;amp; welcome</text>
            <text start="1.75" dur="2">it&amp;#39;s <font color="#fff">fine</font></text>
            <text start="3.75" dur="1"></text>
            <text start="4.75">&lt;b&gt;bold&lt;/b&gt;</text>
        </transcript>"##;

        let snippets = parse_timedtext(xml).unwrap();
        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0].text, "hello & welcome");
        assert_eq!(snippets[0].start, 0.5);
        assert_eq!(snippets[0].duration, 1.25);
        assert_eq!(snippets[1].text, "it's fine");
        assert_eq!(snippets[2].text, "bold");
        assert_eq!(snippets[2].duration, 0.0);
    }

    #[test]
    fn test_self_closed_elements_are_skipped() {
        let xml = r#"<transcript><text start="1.0" dur="0.5"/><text start="2.0" dur="1">next</text><text start="3.0" /></transcript>"#;

        let snippets = parse_timedtext(xml).unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].text, "next");
        assert_eq!(snippets[0].start, 2.0);
        assert_eq!(snippets[0].duration, 1.0);
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(matches!(parse_timedtext("  \n"), Err(ServiceError::EmptyTranscript)));
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_entities("&#65;&#x42;&unknown;"), "AB&unknown;");
    }
}
