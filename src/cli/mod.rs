use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "subex",
    about = "Subex - List and extract subtitle tracks from YouTube videos",
    version,
    long_about = "A CLI tool that takes a YouTube URL, lists the subtitle tracks available for the video and retrieves the text of the track you choose. Run without a subcommand for an interactive session."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "SUBEX_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the subtitle tracks available for a video
    List {
        /// YouTube URL (youtube.com/watch?v=... or youtu.be/...)
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Retrieve the subtitles of one track
    Fetch {
        /// YouTube URL (youtube.com/watch?v=... or youtu.be/...)
        #[arg(value_name = "URL")]
        url: String,

        /// Language code of the track to retrieve (as shown by `list`)
        #[arg(short, long, value_name = "LANG")]
        lang: String,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE", conflicts_with = "save")]
        output: Option<PathBuf>,

        /// Save as subtitles_<id>_<lang>.<ext> in the configured output directory
        #[arg(short, long)]
        save: bool,
    },

    /// Interactive session: enter a URL, pick a track, read and save its subtitles
    Interactive,

    /// Show or create the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported URL formats
    Platforms,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text, one caption per line
    Text,
    /// JSON with timestamps
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl OutputFormat {
    /// Parse a format name as written in the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }

    /// MIME type of the exported artifact
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text/plain",
            OutputFormat::Json => "application/json",
            OutputFormat::Srt => "application/x-subrip",
            OutputFormat::Vtt => "text/vtt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}
