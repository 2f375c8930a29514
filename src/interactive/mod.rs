//! Terminal form around a [`SessionController`].
//!
//! The loop mirrors a request/response form: the user submits a URL, the track list is
//! shown, a track is picked by number, its text is printed and can be saved once.

use anyhow::Result;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, BufReader, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use crate::session::{RetrievedSubtitles, SessionController, SessionState};
use crate::transcript::TranscriptService;
use crate::utils::{extract_domain, format_duration, format_file_size};

const NOTICE: &str = "Some auto-generated subtitles cannot be extracted because of YouTube policy, \
even when they are visible on the website. If you need subtitles, try several videos.";

/// One user action, parsed from a line of input
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Submit a URL ("fetch track list")
    FetchList(String),
    /// Pick a listed track by its zero-based index ("fetch track")
    Select(usize),
    /// Save the last retrieved subtitles
    Save,
    /// Discard the session state
    Reset,
    Quit,
    /// Track number outside the listing
    OutOfRange(usize),
}

/// Interpret a line of input given how many tracks are currently listed
pub fn parse_action(input: &str, track_count: usize) -> Action {
    let input = input.trim();
    match input {
        "q" | "quit" | "exit" => Action::Quit,
        "r" | "reset" | "refresh" => Action::Reset,
        "s" | "save" => Action::Save,
        _ => match input.parse::<usize>() {
            Ok(n) if track_count > 0 && (1..=track_count).contains(&n) => Action::Select(n - 1),
            Ok(n) if track_count > 0 => Action::OutOfRange(n),
            _ => Action::FetchList(input.to_string()),
        },
    }
}

/// Where user input comes from
enum Input {
    /// Line editing on the attached terminal
    Console,
    /// Piped or scripted input, ends at EOF
    Lines(Box<dyn BufRead + Send>),
}

/// Interactive terminal session
pub struct InteractiveSession<S> {
    controller: SessionController<S>,
    output_dir: PathBuf,
    quiet: bool,
    term: Term,
    input: Input,
    last: Option<RetrievedSubtitles>,
}

impl<S: TranscriptService> InteractiveSession<S> {
    /// Session reading from stdin; line editing is used only when stdin is a terminal
    pub fn new(controller: SessionController<S>, output_dir: PathBuf, quiet: bool) -> Self {
        let input = if std::io::stdin().is_terminal() {
            Input::Console
        } else {
            Input::Lines(Box::new(BufReader::new(std::io::stdin())))
        };
        Self::with_input(controller, output_dir, quiet, input)
    }

    /// Session reading lines from `reader` until EOF
    pub fn from_reader<R>(controller: SessionController<S>, output_dir: PathBuf, quiet: bool, reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self::with_input(controller, output_dir, quiet, Input::Lines(Box::new(reader)))
    }

    fn with_input(controller: SessionController<S>, output_dir: PathBuf, quiet: bool, input: Input) -> Self {
        Self {
            controller,
            output_dir,
            quiet,
            term: Term::stdout(),
            input,
            last: None,
        }
    }

    /// Run until the user quits or input ends
    pub async fn run(&mut self) -> Result<()> {
        self.term.write_line(&format!("{}", style("YouTube subtitle extractor").bold()))?;
        self.term.write_line(&format!("{} {}", style("note:").yellow(), NOTICE))?;
        self.print_help()?;

        loop {
            self.term.write_str(&format!("{} ", style(">").cyan().bold()))?;
            let Some(line) = self.read_input()? else {
                break;
            };

            match parse_action(&line, self.controller.tracks().len()) {
                Action::Quit => break,
                Action::Reset => {
                    self.controller.reset();
                    self.last = None;
                    self.info("Session cleared. Enter a URL to start again.")?;
                }
                Action::Save => self.save()?,
                Action::OutOfRange(n) => {
                    self.error(&format!(
                        "There is no track {}; pick 1-{}",
                        n,
                        self.controller.tracks().len()
                    ))?;
                }
                Action::Select(index) => self.fetch_track(index).await?,
                Action::FetchList(url) => self.fetch_track_list(&url).await?,
            }
        }

        Ok(())
    }

    async fn fetch_track_list(&mut self, url: &str) -> Result<()> {
        self.last = None;

        let spinner = self.spinner("Looking up subtitle languages...");
        let state = self.controller.fetch_track_list(url).await;
        spinner.finish_and_clear();

        let lines = match state {
            SessionState::Ready { video_id, tracks } => {
                let mut lines = vec![format!(
                    "{} track(s) for {}:",
                    tracks.len(),
                    style(video_id).bold()
                )];
                lines.extend(
                    tracks
                        .iter()
                        .enumerate()
                        .map(|(i, track)| format!("  {:>2}. {}", i + 1, track.label())),
                );
                lines.push("Enter a track number to extract its subtitles.".to_string());
                Ok(lines)
            }
            SessionState::Error(error) => Err(error.user_message()),
            SessionState::Idle => Ok(Vec::new()),
        };

        match lines {
            Ok(lines) => {
                for line in lines {
                    self.term.write_line(&line)?;
                }
            }
            Err(message) => {
                self.error(&message)?;
                if !crate::extractors::supports_url(url) {
                    if let Some(domain) = extract_domain(url.trim()) {
                        self.info(&format!("{} is not a supported host", domain))?;
                    }
                }
                self.info("Enter a URL and press enter to list its subtitle languages.")?;
            }
        }
        Ok(())
    }

    async fn fetch_track(&mut self, index: usize) -> Result<()> {
        let Some(track) = self.controller.tracks().get(index).cloned() else {
            return Ok(());
        };

        let spinner = self.spinner("Extracting subtitles...");
        let result = self.controller.fetch_track(&track).await;
        spinner.finish_and_clear();

        match result {
            Ok(retrieved) => {
                let length = retrieved
                    .transcript
                    .snippets
                    .last()
                    .map(|s| s.start + s.duration)
                    .unwrap_or(0.0);

                self.term.write_line(&format!(
                    "{} {} ({} captions, {})",
                    style("Extracted subtitles:").green().bold(),
                    retrieved.track.label(),
                    retrieved.transcript.snippets.len(),
                    format_duration(length)
                ))?;
                self.term.write_line(&"-".repeat(60))?;
                self.term.write_line(&retrieved.text)?;
                self.term.write_line(&"-".repeat(60))?;
                self.info(&format!(
                    "Enter 's' to save as {}",
                    retrieved.export().file_name
                ))?;
                self.last = Some(retrieved);
            }
            Err(error) => self.error(&error.user_message())?,
        }
        Ok(())
    }

    /// Download action: writes the artifact once, then forgets it
    fn save(&mut self) -> Result<()> {
        let Some(retrieved) = self.last.take() else {
            return self.error("Nothing to save yet; extract a track first.");
        };

        let export = retrieved.export();
        match export.save_to(&self.output_dir) {
            Ok(path) => self.info(&format!(
                "Saved {} ({}, {})",
                path.display(),
                export.mime_type,
                format_file_size(export.content.len() as u64)
            )),
            Err(e) => {
                self.last = Some(retrieved);
                self.error(&format!("{:#}", e))
            }
        }
    }

    /// Next line of input, `None` once piped input is exhausted
    fn read_input(&mut self) -> Result<Option<String>> {
        match &mut self.input {
            Input::Console => Ok(Some(self.term.read_line()?)),
            Input::Lines(reader) => {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                Ok(Some(line))
            }
        }
    }

    fn print_help(&self) -> Result<()> {
        self.info("Enter a YouTube URL to list its subtitle languages. Commands: <number> extract track, s save, r reset, q quit.")
    }

    fn spinner(&self, message: &'static str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            progress.set_style(style);
        }
        progress.set_message(message);
        progress.enable_steady_tick(Duration::from_millis(100));
        progress
    }

    fn info(&self, message: &str) -> Result<()> {
        self.term.write_line(&format!("{}", style(message).dim()))?;
        Ok(())
    }

    fn error(&self, message: &str) -> Result<()> {
        self.term.write_line(&format!("{} {}", style("error:").red().bold(), message))?;
        Ok(())
    }
}
