use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::{OriginKind, SourceIdentity};
use crate::{ExtractorError, Result};

/// Environment variable consulted for the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_RATE_LIMIT_DELAY: f64 = 2.0;

/// Validated pipeline configuration
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Gemini model name
    pub model: String,

    /// Pause between consecutive jobs
    pub rate_limit_delay: Duration,

    /// Prompt template with `{title}`, `{section}`, `{course_context}` and `{output_format}`
    pub prompt_template: String,

    /// Free-form description of the course, substituted into the prompt
    pub course_context: String,

    /// Expected output structure, substituted into the prompt
    pub output_format: String,

    /// Resolved API key
    pub api_key: String,

    /// Ordered job list
    pub jobs: Vec<Job>,
}

/// One video to process
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Option<String>,
    pub title: Option<String>,
    pub section: Option<String>,
    pub source: VideoSource,
    pub output_path: PathBuf,
}

/// Where a job's video comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    Local(PathBuf),
    Remote(String),
}

impl VideoSource {
    pub fn origin_kind(&self) -> OriginKind {
        match self {
            VideoSource::Local(_) => OriginKind::Local,
            VideoSource::Remote(_) => OriginKind::Remote,
        }
    }

    /// Cache key for this source
    pub fn identity(&self) -> SourceIdentity {
        match self {
            VideoSource::Local(path) => SourceIdentity::LocalPath(path.clone()),
            VideoSource::Remote(url) => SourceIdentity::RemoteUrl(url.clone()),
        }
    }

    /// The source as written in the config file
    pub fn descriptor(&self) -> String {
        match self {
            VideoSource::Local(path) => path.display().to_string(),
            VideoSource::Remote(url) => url.clone(),
        }
    }
}

impl Job {
    /// Title used for progress and failure reporting
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.source.descriptor())
    }

    /// Whether any of the job's identifiers is in `wanted`
    pub fn matches_any(&self, wanted: &[String]) -> bool {
        wanted.iter().any(|w| {
            self.id.as_deref() == Some(w.as_str()) || self.source.descriptor() == *w
        })
    }
}

/// On-disk shape of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default = "default_model")]
    model: String,

    #[serde(default = "default_rate_limit_delay")]
    rate_limit_delay: f64,

    #[serde(default)]
    prompt_template: String,

    #[serde(default)]
    course_context: String,

    #[serde(default)]
    output_format: String,

    #[serde(default)]
    api_key: Option<String>,

    #[serde(default)]
    videos: Vec<RawJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawJob {
    id: Option<String>,
    title: Option<String>,
    section: Option<String>,
    path: Option<PathBuf>,
    youtube_url: Option<String>,
    output: Option<PathBuf>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_rate_limit_delay() -> f64 {
    DEFAULT_RATE_LIMIT_DELAY
}

impl RawJob {
    fn validate(self, index: usize) -> Result<Job> {
        let label = self
            .id
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| format!("#{}", index + 1));

        // Blank values count as absent
        let path = self
            .path
            .filter(|path| !path.to_string_lossy().trim().is_empty());
        let youtube_url = self.youtube_url.filter(|url| !url.trim().is_empty());

        let source = match (path, youtube_url) {
            (Some(path), None) => VideoSource::Local(path),
            (None, Some(url)) => VideoSource::Remote(url),
            (Some(_), Some(_)) => {
                return Err(ExtractorError::Config(format!(
                    "video {} specifies both 'path' and 'youtube_url'",
                    label
                )))
            }
            (None, None) => {
                return Err(ExtractorError::Config(format!(
                    "video {} must specify either 'youtube_url' or 'path'",
                    label
                )))
            }
        };

        let output_path = self.output.ok_or_else(|| {
            ExtractorError::Config(format!("video {} is missing 'output'", label))
        })?;

        Ok(Job {
            id: self.id,
            title: self.title,
            section: self.section,
            source,
            output_path,
        })
    }
}

impl Configuration {
    /// Load configuration from `path`, resolving the API key.
    ///
    /// `api_key_override` takes precedence over `GEMINI_API_KEY`, which takes
    /// precedence over the `api_key` field in the file.
    pub fn load(path: &Path, api_key_override: Option<&str>) -> Result<Self> {
        if !path.exists() {
            return Err(ExtractorError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs_err::read_to_string(path)
            .map_err(|e| ExtractorError::Config(format!("Failed to read config file: {}", e)))?;

        let env_key = std::env::var(API_KEY_ENV).ok();
        Self::from_yaml(&content, api_key_override, env_key.as_deref())
    }

    /// Parse and validate config text with explicit credential inputs
    pub fn from_yaml(
        content: &str,
        api_key_override: Option<&str>,
        env_key: Option<&str>,
    ) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse config file: {}", e)))?;

        let rate_limit_delay = Duration::try_from_secs_f64(raw.rate_limit_delay).map_err(|_| {
            ExtractorError::Config(format!(
                "rate_limit_delay must be a non-negative number of seconds, got {}",
                raw.rate_limit_delay
            ))
        })?;

        let jobs = raw
            .videos
            .into_iter()
            .enumerate()
            .map(|(i, job)| job.validate(i))
            .collect::<Result<Vec<_>>>()?;

        let api_key = resolve_api_key(api_key_override, env_key, raw.api_key.as_deref())?;

        Ok(Self {
            model: raw.model,
            rate_limit_delay,
            prompt_template: raw.prompt_template,
            course_context: raw.course_context,
            output_format: raw.output_format,
            api_key,
            jobs,
        })
    }

    /// Default config location: `./config.yaml` if present, otherwise the
    /// platform config directory
    pub fn default_path() -> PathBuf {
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return local_config;
        }

        dirs::config_dir()
            .map(|dir| dir.join("video-extractor").join("config.yaml"))
            .unwrap_or(local_config)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Model: {}", self.model);
        println!("  Rate Limit Delay: {}s", self.rate_limit_delay.as_secs_f64());
        println!("  API Key: {}", if self.api_key.is_empty() { "missing" } else { "set" });
        println!("  Videos: {}", self.jobs.len());
        for job in &self.jobs {
            let kind = match job.source.origin_kind() {
                OriginKind::Local => "file",
                OriginKind::Remote => "youtube",
            };
            println!(
                "    • [{}] {} ({}) -> {}",
                job.id.as_deref().unwrap_or("-"),
                job.display_title(),
                kind,
                job.output_path.display()
            );
        }
    }
}

/// Pick the API key by precedence: override, then environment, then file.
/// Blank values are ignored.
pub fn resolve_api_key(
    override_key: Option<&str>,
    env_key: Option<&str>,
    file_key: Option<&str>,
) -> Result<String> {
    [override_key, env_key, file_key]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ExtractorError::Credential(format!(
                "{} not found. Set it as environment variable, in config.yaml, or pass --api-key",
                API_KEY_ENV
            ))
        })
}
