//! Google Gemini REST client
//!
//! Covers the three calls the pipeline needs: resumable file upload, file
//! status lookup, and `generateContent` against an uploaded file or a
//! YouTube URL.

pub mod error;
pub mod types;

pub use error::GeminiError;
pub use types::{relaxed_safety_settings, FileRef, FileState, RemoteFile, SafetySetting};

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::path::Path;
use tracing::{debug, warn};

use types::{ApiErrorBody, GenerateContentRequest, GenerateContentResponse, UploadResponse};

type Result<T> = std::result::Result<T, GeminiError>;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// The external generation service, as seen by the pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Upload a local file; the returned handle stays valid for repeated use
    async fn upload_file(&self, path: &Path, display_name: &str, mime_type: &str)
        -> Result<RemoteFile>;

    /// Current state of a previously uploaded file
    async fn get_file(&self, name: &str) -> Result<RemoteFile>;

    /// Generate text for `prompt` over the referenced video. `None` when the
    /// model returned no text.
    async fn generate(
        &self,
        model: &str,
        source: &FileRef,
        prompt: &str,
        safety: &[SafetySetting],
    ) -> Result<Option<String>>;
}

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (for proxies or test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `gemini-1.5-pro` and `models/gemini-1.5-pro` are both accepted.
    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    /// Turn non-2xx responses into `GeminiError::Api`.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or(body);

        warn!(status = %status, error = %message, "Gemini API error");
        Err(GeminiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn upload_file(
        &self,
        path: &Path,
        display_name: &str,
        mime_type: &str,
    ) -> Result<RemoteFile> {
        let content = tokio::fs::read(path).await?;
        let length = content.len().to_string();

        // Resumable protocol: start a session, then send the bytes and finalize.
        let start = self
            .http_client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", &length)
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini upload start failed");
                GeminiError::Network(e.to_string())
            })?;
        let start = Self::check_status(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GeminiError::Parse("upload session returned no upload URL".into()))?
            .to_string();

        debug!(path = %path.display(), bytes = %length, "Uploading video bytes");

        let response = self
            .http_client
            .post(upload_url)
            .header("Content-Length", &length)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(content)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini upload failed");
                GeminiError::Network(e.to_string())
            })?;

        let uploaded: UploadResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        Ok(uploaded.file)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        let response = self
            .http_client
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))
    }

    async fn generate(
        &self,
        model: &str,
        source: &FileRef,
        prompt: &str,
        safety: &[SafetySetting],
    ) -> Result<Option<String>> {
        let start = std::time::Instant::now();
        let request = GenerateContentRequest::for_video(source, prompt, safety);

        let response = self
            .http_client
            .post(format!(
                "{}/v1beta/{}:generateContent",
                self.base_url,
                Self::model_path(model)
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                GeminiError::Network(e.to_string())
            })?;

        let body: GenerateContentResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        if let Some(reason) = body.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
            warn!(block_reason = %reason, "Gemini blocked the prompt");
        }

        debug!(
            model = %model,
            duration_ms = start.elapsed().as_millis(),
            "Gemini generateContent"
        );

        Ok(body.text())
    }
}
