use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod template;

use crate::config::{Configuration, Job, VideoSource};
use crate::gemini::{relaxed_safety_settings, GenerationService, SafetySetting};
use crate::sources::PreparedSource;
use crate::{ExtractorError, Result};

/// Placeholder value for a missing title or section
const UNKNOWN: &str = "Unknown";

/// Raw model output for one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The extracted markdown text
    pub text: String,

    /// Number of characters in `text`
    pub char_count: usize,
}

impl ExtractionResult {
    pub fn new(text: String) -> Self {
        let char_count = text.chars().count();
        Self { text, char_count }
    }
}

/// Per-job values used in the prompt and the document header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMetadata {
    pub title: Option<String>,
    pub section: Option<String>,
    pub source: VideoSource,
}

impl From<&Job> for JobMetadata {
    fn from(job: &Job) -> Self {
        Self {
            title: job.title.clone(),
            section: job.section.clone(),
            source: job.source.clone(),
        }
    }
}

/// Sends prepared videos to the model with the configured prompt
pub struct ExtractionClient {
    service: Arc<dyn GenerationService>,
    model: String,
    prompt_template: String,
    course_context: String,
    output_format: String,
    safety: Vec<SafetySetting>,
}

impl ExtractionClient {
    /// Create a client using the model and prompt settings from `config`
    pub fn new(config: &Configuration, service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            model: config.model.clone(),
            prompt_template: config.prompt_template.clone(),
            course_context: config.course_context.clone(),
            output_format: config.output_format.clone(),
            safety: relaxed_safety_settings(),
        }
    }

    /// Fill the prompt template for one job
    pub fn build_prompt(&self, metadata: &JobMetadata) -> Result<String> {
        let title = metadata.title.as_deref().unwrap_or(UNKNOWN);
        let section = metadata.section.as_deref().unwrap_or(UNKNOWN);

        template::render(
            &self.prompt_template,
            &[
                ("title", title),
                ("section", section),
                ("course_context", self.course_context.as_str()),
                ("output_format", self.output_format.as_str()),
            ],
        )
    }

    /// Extract structured content from a prepared video
    pub async fn extract(
        &self,
        source: &PreparedSource,
        metadata: &JobMetadata,
    ) -> Result<ExtractionResult> {
        let prompt = self.build_prompt(metadata)?;

        tracing::info!("Extracting content with {}...", self.model);

        let text = self
            .service
            .generate(&self.model, &source.file_ref(), &prompt, &self.safety)
            .await?;

        let text = match text {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(ExtractorError::EmptyResponse),
        };

        let result = ExtractionResult::new(text);
        tracing::info!("Content extracted ({} chars)", result.char_count);

        Ok(result)
    }
}
