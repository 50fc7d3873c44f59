use super::{OriginKind, PollPolicy, PreparedSource, ReadinessState, SourcePreparer, VideoFormat};
use crate::config::VideoSource;
use crate::gemini::{GenerationService, RemoteFile};
use crate::utils::format_file_size;
use crate::{ExtractorError, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;

/// Preparer for local video files: upload, then wait for processing
pub struct LocalFilePreparer {
    service: Arc<dyn GenerationService>,
    poll: PollPolicy,
    show_progress: bool,
}

impl LocalFilePreparer {
    pub fn new(service: Arc<dyn GenerationService>, poll: PollPolicy) -> Self {
        Self {
            service,
            poll,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Check that the file exists and is a regular file
    fn validate_file(&self, path: &Path) -> Result<u64> {
        if !path.is_file() {
            return Err(ExtractorError::NotFound(path.to_path_buf()));
        }

        let metadata =
            fs_err::metadata(path).map_err(|_| ExtractorError::NotFound(path.to_path_buf()))?;

        Ok(metadata.len())
    }

    fn spinner(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            progress.set_style(style);
        }
        progress
    }

    /// Poll the uploaded file until the service finishes processing it
    async fn wait_until_ready(&self, mut file: RemoteFile) -> Result<RemoteFile> {
        let progress = self.spinner();
        progress.set_message("Processing video...");

        let start_time = Instant::now();
        let mut check_count = 0;

        while ReadinessState::from(file.state) == ReadinessState::Processing {
            if let Some(timeout) = self.poll.timeout {
                if start_time.elapsed() >= timeout {
                    progress.finish_with_message("Processing timed out");
                    return Err(ExtractorError::Processing(format!(
                        "{} still processing after {}s",
                        file.name,
                        timeout.as_secs()
                    )));
                }
            }

            check_count += 1;
            progress.set_message(format!(
                "Processing video... ({}s elapsed, check #{})",
                start_time.elapsed().as_secs(),
                check_count
            ));

            sleep(self.poll.interval).await;
            file = self.service.get_file(&file.name).await?;
        }

        if ReadinessState::from(file.state) == ReadinessState::Failed {
            progress.finish_with_message("Video processing failed");
            let reason = file
                .error
                .as_ref()
                .and_then(|e| e.message.clone())
                .unwrap_or_else(|| "state FAILED".to_string());
            return Err(ExtractorError::Processing(format!("{}: {}", file.name, reason)));
        }

        progress.finish_and_clear();
        Ok(file)
    }
}

#[async_trait]
impl SourcePreparer for LocalFilePreparer {
    async fn prepare(&self, source: &VideoSource, display_name: Option<&str>) -> Result<PreparedSource> {
        let path = match source {
            VideoSource::Local(path) => path,
            VideoSource::Remote(url) => {
                return Err(ExtractorError::UnsupportedSource(format!(
                    "{} is a URL, not a local file",
                    url
                )))
            }
        };

        let size = self.validate_file(path)?;

        let display_name = display_name
            .map(str::to_string)
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = VideoFormat::from_path(path).mime_type();

        tracing::info!(
            "Uploading: {} ({})",
            path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
            format_file_size(size)
        );

        let uploaded = self.service.upload_file(path, &display_name, mime_type).await?;
        tracing::debug!("Upload complete as {}, waiting for processing", uploaded.name);

        let ready = self.wait_until_ready(uploaded).await?;
        tracing::info!("Video ready: {}", ready.name);

        Ok(PreparedSource {
            uri: ready.uri,
            mime_type: ready.mime_type.unwrap_or_else(|| mime_type.to_string()),
            display_name,
            origin_kind: OriginKind::Local,
            readiness: ReadinessState::from(ready.state),
            remote_name: Some(ready.name),
        })
    }

    fn origin_kind(&self) -> OriginKind {
        OriginKind::Local
    }

    fn platform_name(&self) -> &'static str {
        "Local File"
    }
}
