use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "video-extractor",
    about = "Video Extractor - Extract structured content from course videos using Google Gemini",
    version,
    long_about = "Batch-processes the videos listed in a YAML config (local files or YouTube URLs), asks Gemini to extract structured content from each, and writes one markdown document per video."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators and the final summary
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process videos from the config file
    Run {
        /// Path to configuration file (default: ./config.yaml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Specific video IDs, paths or YouTube URLs to process (default: all from config)
        #[arg(long, value_name = "VIDEO", num_args = 1..)]
        videos: Vec<String>,

        /// Gemini API key (overrides config and environment variable)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,

        /// Give up waiting for an uploaded video to finish processing after this many seconds
        #[arg(long, value_name = "SECONDS")]
        processing_timeout: Option<u64>,
    },

    /// Validate the config file and list its videos
    Validate {
        /// Path to configuration file (default: ./config.yaml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Gemini API key (overrides config and environment variable)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// List supported video sources
    Sources,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_with_video_filter() {
        let cli = Cli::parse_from([
            "video-extractor",
            "run",
            "--config",
            "course.yaml",
            "--videos",
            "intro",
            "https://youtu.be/abc123",
        ]);

        match cli.command {
            Commands::Run {
                config,
                videos,
                api_key,
                processing_timeout,
            } => {
                assert_eq!(config, Some(PathBuf::from("course.yaml")));
                assert_eq!(videos, vec!["intro", "https://youtu.be/abc123"]);
                assert!(api_key.is_none());
                assert!(processing_timeout.is_none());
            }
            _ => panic!("expected run command"),
        }
    }
}
