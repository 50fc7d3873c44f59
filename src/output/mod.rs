use chrono::{Local, NaiveDate};
use std::path::Path;

use crate::config::VideoSource;
use crate::extraction::{ExtractionResult, JobMetadata};
use crate::{ExtractorError, Result};

/// Writes extracted content as markdown with a metadata header
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentWriter;

impl DocumentWriter {
    pub fn new() -> Self {
        Self
    }

    /// Metadata header: title, section, extraction date and source line
    pub fn render_header(metadata: &JobMetadata, date: NaiveDate) -> String {
        let (label, value) = match &metadata.source {
            VideoSource::Remote(url) => ("YouTube URL", url.clone()),
            VideoSource::Local(path) => ("Video File", path.display().to_string()),
        };

        format!(
            "# {}\n\n**Section:** {}\n**Extracted:** {}\n**{}:** {}\n\n---\n",
            metadata.title.as_deref().unwrap_or("Untitled"),
            metadata.section.as_deref().unwrap_or("Unknown Section"),
            date.format("%Y-%m-%d"),
            label,
            value
        )
    }

    /// Full document body: header, blank line, extracted text
    pub fn render(text: &str, metadata: &JobMetadata, date: NaiveDate) -> String {
        format!("{}\n\n{}", Self::render_header(metadata, date), text)
    }

    /// Write the document to `output_path`, replacing any existing file
    pub async fn write(
        &self,
        result: &ExtractionResult,
        metadata: &JobMetadata,
        output_path: &Path,
    ) -> Result<()> {
        let write_error = |source| ExtractorError::Write {
            path: output_path.to_path_buf(),
            source,
        };

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).map_err(write_error)?;
        }

        let content = Self::render(&result.text, metadata, Local::now().date_naive());
        fs_err::write(output_path, content).map_err(write_error)?;

        tracing::info!("Saved to: {}", output_path.display());
        Ok(())
    }
}
