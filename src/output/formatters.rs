use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::transcript::{TrackOrigin, Transcript, TranscriptSnippet};
use crate::utils::format_timestamp;

/// JSON document written for `--format json`
#[derive(Serialize)]
struct JsonTranscript<'a> {
    video_id: &'a str,
    language_code: &'a str,
    origin: TrackOrigin,
    fetched_at: DateTime<Utc>,
    snippets: &'a [TranscriptSnippet],
}

/// Plain text, one caption per line
pub fn format_as_text(transcript: &Transcript) -> String {
    transcript.plain_text()
}

pub fn format_as_json(transcript: &Transcript) -> Result<String> {
    let document = JsonTranscript {
        video_id: transcript.video_id.as_str(),
        language_code: &transcript.language_code,
        origin: transcript.origin,
        fetched_at: Utc::now(),
        snippets: &transcript.snippets,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn format_as_srt(transcript: &Transcript) -> String {
    cues(transcript)
        .enumerate()
        .map(|(index, (start, end, text))| {
            format!(
                "{}\n{} --> {}\n{}\n",
                index + 1,
                format_timestamp(start, ','),
                format_timestamp(end, ','),
                text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_as_vtt(transcript: &Transcript) -> String {
    let mut output = String::from("WEBVTT\n");
    for (start, end, text) in cues(transcript) {
        output.push_str(&format!(
            "\n{} --> {}\n{}\n",
            format_timestamp(start, '.'),
            format_timestamp(end, '.'),
            text
        ));
    }
    output
}

/// Cue timings; a caption ends when it expires or when the next one starts, whichever is first
fn cues(transcript: &Transcript) -> impl Iterator<Item = (f64, f64, &str)> + '_ {
    let snippets = &transcript.snippets;
    snippets.iter().enumerate().map(move |(i, snippet)| {
        let mut end = snippet.start + snippet.duration;
        if let Some(next) = snippets.get(i + 1) {
            if next.start > snippet.start && next.start < end {
                end = next.start;
            }
        }
        (snippet.start, end, snippet.text.as_str())
    })
}
