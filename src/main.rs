use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subex::cli::{Cli, Commands};
use subex::config::Config;
use subex::extractors::HOST_PATTERNS;
use subex::interactive::InteractiveSession;
use subex::session::{SessionController, SessionState};
use subex::transcript::YoutubeTranscriptService;
use subex::{output, utils, SubexError};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "subex=debug" } else { "subex=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::List { url } => {
            let mut controller = new_controller(&config)?;

            match controller.fetch_track_list(&url).await {
                SessionState::Ready { video_id, tracks } => {
                    println!("Subtitle tracks for {}:", video_id);
                    for track in tracks {
                        println!("  • {}", track.label());
                    }
                }
                SessionState::Error(error) => anyhow::bail!(error.user_message()),
                SessionState::Idle => {}
            }
        }
        Commands::Fetch {
            url,
            lang,
            format,
            output,
            save,
        } => {
            let format = match format {
                Some(format) => format,
                None => config.output_format()?,
            };
            let mut controller = new_controller(&config)?;

            if let SessionState::Error(error) = controller.fetch_track_list(&url).await {
                anyhow::bail!(error.user_message());
            }

            let track = controller.find_track(&lang).cloned().ok_or_else(|| {
                SubexError::TrackNotListed {
                    language: lang.clone(),
                    available: controller
                        .tracks()
                        .iter()
                        .map(|t| t.language_code.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }
            })?;

            tracing::info!("Selected track: {}", track.label());

            let retrieved = controller
                .fetch_track(&track)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            match (output, save) {
                (Some(path), _) => {
                    output::save_to_file(&retrieved.transcript, &path, format)?;
                    println!("Subtitles saved to: {}", path.display());
                }
                (None, true) => {
                    let export = output::export(&retrieved.transcript, format)?;
                    let path = export.save_to(&config.output_dir()?)?;
                    println!(
                        "Subtitles saved to: {} ({})",
                        path.display(),
                        utils::format_file_size(export.content.len() as u64)
                    );
                }
                (None, false) => {
                    output::print_to_console(&retrieved.transcript, format)?;
                }
            }
        }
        Commands::Interactive => {
            let controller = new_controller(&config)?;
            let mut session = InteractiveSession::new(controller, config.output_dir()?, cli.quiet);
            session.run().await?;
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                if path.exists() {
                    println!("Config file already exists: {}", path.display());
                } else {
                    config.save(&path)?;
                    println!("Wrote default configuration to: {}", path.display());
                }
            }
        }
        Commands::Platforms => {
            println!("Supported URL formats:");
            for pattern in &HOST_PATTERNS {
                println!("  • {} ({})", pattern.platform, pattern.example);
            }
        }
    }

    Ok(())
}

fn new_controller(config: &Config) -> Result<SessionController<YoutubeTranscriptService>> {
    let service = YoutubeTranscriptService::new(&config.service)?;
    Ok(SessionController::with_filter(service, config.app.track_filter))
}
