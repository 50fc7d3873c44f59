use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_extractor::cli::{Cli, Commands};
use video_extractor::config::Configuration;
use video_extractor::gemini::GeminiClient;
use video_extractor::pipeline::{BatchOrchestrator, JobFilter};
use video_extractor::sources::{PollPolicy, SourceRegistry};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "video_extractor=debug"
    } else {
        "video_extractor=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // A missing .env is fine; the key may come from elsewhere
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error initializing extractor: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn load_config(path: Option<PathBuf>, api_key: Option<&str>) -> Result<Configuration> {
    let path = path.unwrap_or_else(Configuration::default_path);
    Configuration::load(&path, api_key)
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Returns whether every job succeeded
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Run {
            config,
            videos,
            api_key,
            processing_timeout,
        } => {
            let config = load_config(config, api_key.as_deref())?;
            tracing::info!("Using model: {}", config.model);

            let service = Arc::new(GeminiClient::new(config.api_key.clone()));
            let poll = PollPolicy {
                timeout: processing_timeout.map(Duration::from_secs),
                ..PollPolicy::default()
            };

            let mut orchestrator = BatchOrchestrator::new(config, service, poll, !cli.quiet);
            let summary = orchestrator.run(&JobFilter::new(videos)).await;

            if !cli.quiet {
                summary.print();
            }

            Ok(summary.all_succeeded())
        }
        Commands::Validate { config, api_key } => {
            let config = load_config(config, api_key.as_deref())?;
            config.display();
            Ok(true)
        }
        Commands::Sources => {
            let platforms = SourceRegistry::new(
                Arc::new(GeminiClient::new(String::new())),
                PollPolicy::default(),
                false,
            )
            .list_platforms();

            println!("Supported video sources:");
            for platform in platforms {
                match platform {
                    "YouTube" => println!(
                        "  • YouTube (youtube.com/watch?v=..., youtu.be/..., youtube.com/embed/...)"
                    ),
                    "Local File" => println!(
                        "  • Local video files (mp4, mov, avi, mkv, webm, mpeg, wmv, flv, 3gp)"
                    ),
                    other => println!("  • {}", other),
                }
            }
            Ok(true)
        }
    }
}
