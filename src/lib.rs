//! Subex - A Rust CLI tool for extracting subtitles from YouTube videos
//!
//! This library provides functionality to extract a video identifier from a URL, list the
//! subtitle tracks YouTube offers for that video and retrieve the text of a chosen track.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod interactive;
pub mod output;
pub mod session;
pub mod transcript;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{extract_video_id, VideoId};
pub use session::{SessionController, SessionError, SessionState, SubtitleExport, TrackFilter};
pub use transcript::{TrackDescriptor, TrackOrigin, Transcript, TranscriptService};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types raised by the command line front end
#[derive(thiserror::Error, Debug)]
pub enum SubexError {
    #[error("No {language} track is available for this video (available: {available})")]
    TrackNotListed { language: String, available: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
