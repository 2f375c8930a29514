use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::session::SubtitleExport;
use crate::transcript::Transcript;

pub mod formatters;

pub use formatters::*;

/// Render a transcript in the requested format
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => format_as_text(transcript),
        OutputFormat::Json => format_as_json(transcript)?,
        OutputFormat::Srt => format_as_srt(transcript),
        OutputFormat::Vtt => format_as_vtt(transcript),
    };
    Ok(content)
}

/// Build the download artifact for a transcript in the requested format
pub fn export(transcript: &Transcript, format: OutputFormat) -> Result<SubtitleExport> {
    let content = format_transcript(transcript, format)?;
    Ok(SubtitleExport::with_format(
        &transcript.video_id,
        &transcript.language_code,
        format,
        content,
    ))
}

/// Save transcript to file
pub fn save_to_file(transcript: &Transcript, path: &Path, format: OutputFormat) -> Result<()> {
    let content = format_transcript(transcript, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcript to console
pub fn print_to_console(transcript: &Transcript, format: OutputFormat) -> Result<()> {
    let content = format_transcript(transcript, format)?;
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::extract_video_id;
    use crate::transcript::{TrackOrigin, TranscriptSnippet};

    fn transcript() -> Transcript {
        Transcript {
            video_id: extract_video_id("https://www.youtube.com/watch?v=xyz").unwrap(),
            language_code: "ja".to_string(),
            origin: TrackOrigin::Manual,
            snippets: vec![TranscriptSnippet { text: "konnichiwa".to_string(), start: 1.0, duration: 2.0 }],
        }
    }

    #[test]
    fn test_export_names_follow_format() {
        let text = export(&transcript(), OutputFormat::Text).unwrap();
        assert_eq!(text.file_name, "subtitles_xyz_ja.txt");
        assert_eq!(text.content, "konnichiwa");

        let vtt = export(&transcript(), OutputFormat::Vtt).unwrap();
        assert_eq!(vtt.file_name, "subtitles_xyz_ja.vtt");
        assert_eq!(vtt.mime_type, "text/vtt");
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");

        save_to_file(&transcript(), &path, OutputFormat::Srt).unwrap();

        let written = fs_err::read_to_string(&path).unwrap();
        assert_eq!(written, "1\n00:00:01,000 --> 00:00:03,000\nkonnichiwa\n");
    }
}
