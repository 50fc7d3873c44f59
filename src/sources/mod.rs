use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub mod cache;
pub mod local;
pub mod youtube;

pub use cache::{MemorySourceCache, SourceCache};

use crate::config::VideoSource;
use crate::gemini::{FileRef, FileState, GenerationService};
use crate::{ExtractorError, Result};

/// Whether a source needs uploading or is referenced directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OriginKind {
    Local,
    Remote,
}

/// Readiness of a prepared source on the service side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessState {
    Processing,
    Ready,
    Failed,
}

impl From<FileState> for ReadinessState {
    /// Only `PROCESSING` and `FAILED` hold a file back; any other state is usable
    fn from(state: FileState) -> Self {
        match state {
            FileState::Processing => ReadinessState::Processing,
            FileState::Failed => ReadinessState::Failed,
            _ => ReadinessState::Ready,
        }
    }
}

/// Cache key: the source exactly as configured
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceIdentity {
    LocalPath(PathBuf),
    RemoteUrl(String),
}

/// A video the generation service can read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedSource {
    /// Uploaded file URI, or the YouTube URL itself
    pub uri: String,

    pub mime_type: String,

    pub display_name: String,

    pub origin_kind: OriginKind,

    pub readiness: ReadinessState,

    /// Service-side resource name (`files/...`) for uploaded files
    pub remote_name: Option<String>,
}

impl PreparedSource {
    /// Reference passed to the generation call
    pub fn file_ref(&self) -> FileRef {
        FileRef {
            uri: self.uri.clone(),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// Supported video container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoFormat {
    Mp4,
    Mov,
    Avi,
    Mkv,
    Webm,
    Mpeg,
    Wmv,
    Flv,
    ThreeGp,
}

impl VideoFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp4" | "m4v" => Some(VideoFormat::Mp4),
            "mov" => Some(VideoFormat::Mov),
            "avi" => Some(VideoFormat::Avi),
            "mkv" => Some(VideoFormat::Mkv),
            "webm" => Some(VideoFormat::Webm),
            "mpeg" | "mpg" => Some(VideoFormat::Mpeg),
            "wmv" => Some(VideoFormat::Wmv),
            "flv" => Some(VideoFormat::Flv),
            "3gp" => Some(VideoFormat::ThreeGp),
            _ => None,
        }
    }

    /// Format for a path, falling back to MP4 for unknown extensions
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(VideoFormat::Mp4)
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "video/mp4",
            VideoFormat::Mov => "video/quicktime",
            VideoFormat::Avi => "video/x-msvideo",
            VideoFormat::Mkv => "video/x-matroska",
            VideoFormat::Webm => "video/webm",
            VideoFormat::Mpeg => "video/mpeg",
            VideoFormat::Wmv => "video/x-ms-wmv",
            VideoFormat::Flv => "video/x-flv",
            VideoFormat::ThreeGp => "video/3gpp",
        }
    }
}

/// How long to wait between status checks, and for how long overall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,

    /// `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: None,
        }
    }
}

/// Trait for turning a configured source into a ready-to-query handle
#[async_trait]
pub trait SourcePreparer: Send + Sync {
    /// Prepare the source for the generation service
    async fn prepare(&self, source: &VideoSource, display_name: Option<&str>) -> Result<PreparedSource>;

    /// Which kind of source this preparer handles
    fn origin_kind(&self) -> OriginKind;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}

/// Registry of preparers plus the prepared-source cache
pub struct SourceRegistry {
    preparers: Vec<Box<dyn SourcePreparer>>,
    cache: Box<dyn SourceCache>,
}

impl SourceRegistry {
    /// Create a registry with the YouTube and local-file preparers
    pub fn new(service: Arc<dyn GenerationService>, poll: PollPolicy, show_progress: bool) -> Self {
        let mut registry = Self::empty();

        registry.register(Box::new(youtube::YoutubePreparer::new()));
        registry.register(Box::new(
            local::LocalFilePreparer::new(service, poll).with_progress(show_progress),
        ));

        registry
    }

    /// Registry with no preparers and an in-memory cache
    pub fn empty() -> Self {
        Self {
            preparers: Vec::new(),
            cache: Box::new(MemorySourceCache::new()),
        }
    }

    /// Swap the cache implementation
    pub fn with_cache(mut self, cache: Box<dyn SourceCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Register a new preparer; earlier registrations win for the same kind
    pub fn register(&mut self, preparer: Box<dyn SourcePreparer>) {
        self.preparers.push(preparer);
    }

    /// Find the preparer for an origin kind
    pub fn find_preparer(&self, kind: OriginKind) -> Option<&dyn SourcePreparer> {
        self.preparers
            .iter()
            .find(|preparer| preparer.origin_kind() == kind)
            .map(|boxed| boxed.as_ref())
    }

    /// List all supported platforms
    pub fn list_platforms(&self) -> Vec<&'static str> {
        self.preparers
            .iter()
            .map(|preparer| preparer.platform_name())
            .collect()
    }

    /// Prepare a source, reusing a cached handle for the same identity
    pub async fn prepare(
        &mut self,
        source: &VideoSource,
        display_name: Option<&str>,
    ) -> Result<PreparedSource> {
        let identity = source.identity();

        if let Some(cached) = self.cache.get(&identity) {
            tracing::info!("Using cached source for {}", source.descriptor());
            return Ok(cached);
        }

        let preparer = self.find_preparer(source.origin_kind()).ok_or_else(|| {
            ExtractorError::UnsupportedSource(format!(
                "no preparer registered for {}",
                source.descriptor()
            ))
        })?;

        let prepared = preparer.prepare(source, display_name).await?;
        self.cache.insert(identity, prepared.clone());

        Ok(prepared)
    }

    /// Drop every cached handle
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
