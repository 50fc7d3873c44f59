//! Video Extractor - batch extraction of structured content from course videos
//!
//! This library turns a configured list of videos (local files or YouTube URLs)
//! into markdown documents by sending each video to Google Gemini together with
//! a templated extraction prompt.
//!
//! The pipeline for each job is: prepare the source (upload or direct
//! reference), extract content with the model, write the document. Jobs run
//! sequentially with a fixed pause between them, and one failing job never
//! aborts the batch.

pub mod cli;
pub mod config;
pub mod extraction;
pub mod gemini;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod utils;

use std::path::PathBuf;

pub use cli::{Cli, Commands};
pub use config::{Configuration, Job, VideoSource};
pub use extraction::{ExtractionClient, ExtractionResult, JobMetadata};
pub use gemini::{GeminiClient, GeminiError, GenerationService};
pub use output::DocumentWriter;
pub use pipeline::{BatchOrchestrator, BatchSummary, JobFilter};
pub use sources::{OriginKind, PreparedSource, SourceRegistry};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Error types specific to the extractor
#[derive(thiserror::Error, Debug)]
pub enum ExtractorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Video file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported video source: {0}")]
    UnsupportedSource(String),

    #[error("Video processing failed: {0}")]
    Processing(String),

    #[error("Prompt template error: {0}")]
    PromptTemplate(String),

    #[error("Empty response from Gemini")]
    EmptyResponse,

    #[error("Extraction service error: {0}")]
    ExtractionService(#[from] GeminiError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
