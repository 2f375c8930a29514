use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::extractors::VideoId;
use crate::utils::sanitize_filename;

/// One-shot download artifact for retrieved subtitles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleExport {
    pub file_name: String,
    pub mime_type: &'static str,
    pub content: String,
}

impl SubtitleExport {
    /// `subtitles_<id>_<lang>.txt`, `text/plain`
    pub fn plain_text(video_id: &VideoId, language_code: &str, text: &str) -> Self {
        Self::with_format(video_id, language_code, OutputFormat::Text, text.to_string())
    }

    /// Artifact for an already formatted document
    pub fn with_format(
        video_id: &VideoId,
        language_code: &str,
        format: OutputFormat,
        content: String,
    ) -> Self {
        Self {
            file_name: file_name(video_id, language_code, format),
            mime_type: format.mime_type(),
            content,
        }
    }

    /// Write the artifact into `dir`, returning the full path
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        fs_err::create_dir_all(dir)?;

        let path = dir.join(&self.file_name);
        fs_err::write(&path, &self.content)
            .with_context(|| format!("Failed to save subtitles to {}", path.display()))?;

        tracing::info!("Saved {} ({} bytes)", path.display(), self.content.len());
        Ok(path)
    }
}

fn file_name(video_id: &VideoId, language_code: &str, format: OutputFormat) -> String {
    format!(
        "subtitles_{}_{}.{}",
        sanitize_filename(video_id.as_str()),
        sanitize_filename(language_code),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::extract_video_id;

    fn video_id(id: &str) -> VideoId {
        extract_video_id(&format!("https://youtu.be/{}", id)).unwrap()
    }

    #[test]
    fn test_plain_text_artifact() {
        let export = SubtitleExport::plain_text(&video_id("dQw4w9WgXcQ"), "pt-BR", "hello");
        assert_eq!(export.file_name, "subtitles_dQw4w9WgXcQ_pt-BR.txt");
        assert_eq!(export.mime_type, "text/plain");
    }

    #[test]
    fn test_formatted_artifact_swaps_extension() {
        let export = SubtitleExport::with_format(&video_id("abc"), "en", OutputFormat::Srt, String::new());
        assert_eq!(export.file_name, "subtitles_abc_en.srt");
        assert_eq!(export.mime_type, "application/x-subrip");
    }

    #[test]
    fn test_identifier_cannot_escape_directory() {
        let export = SubtitleExport::plain_text(&video_id("../../etc"), "en", "x");
        assert_eq!(export.file_name, "subtitles_.._.._etc_en.txt");
    }

    #[test]
    fn test_identifier_punctuation_is_replaced() {
        let id = video_id("abc#t=10");
        assert_eq!(id.as_str(), "abc#t=10");

        let export = SubtitleExport::plain_text(&id, "en", "x");
        assert_eq!(export.file_name, "subtitles_abc_t_10_en.txt");
    }

    #[test]
    fn test_save_to_writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let export = SubtitleExport::plain_text(&video_id("abc"), "en", "hello\nworld");

        let path = export.save_to(&dir.path().join("out")).unwrap();

        assert_eq!(path.file_name().unwrap(), "subtitles_abc_en.txt");
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "hello\nworld");
    }
}
