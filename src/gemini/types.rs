//! Gemini API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Generate Content
// =============================================================================

/// `models/{model}:generateContent` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerateContentRequest {
    /// Single user turn: the video reference followed by the prompt text.
    pub fn for_video(source: &FileRef, prompt: &str, safety: &[SafetySetting]) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::file(source), Part::text(prompt)],
            }],
            safety_settings: safety.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One content part; exactly one field is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn file(source: &FileRef) -> Self {
        Self {
            file_data: Some(FileData {
                mime_type: source.mime_type.clone(),
                file_uri: source.uri.clone(),
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

/// Reference to a video the model can read: an uploaded file URI or a YouTube URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub uri: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Safety settings that let analytical/educational material through.
pub fn relaxed_safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|category| SafetySetting {
            category: category.to_string(),
            threshold: "BLOCK_NONE".to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it produced any.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// =============================================================================
// Files
// =============================================================================

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[default]
    StateUnspecified,
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

/// File resource returned by the Files API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc-123`
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub state: FileState,
    #[serde(default)]
    pub error: Option<ApiStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub file: RemoteFile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    pub code: Option<i32>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let source = FileRef {
            uri: "https://youtu.be/abc123".to_string(),
            mime_type: "video/mp4".to_string(),
        };
        let request =
            GenerateContentRequest::for_video(&source, "Summarize", &relaxed_safety_settings());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value["contents"][0]["parts"][0],
            json!({"fileData": {"mimeType": "video/mp4", "fileUri": "https://youtu.be/abc123"}})
        );
        assert_eq!(value["contents"][0]["parts"][1], json!({"text": "Summarize"}));
        assert_eq!(value["safetySettings"].as_array().unwrap().len(), 4);
        assert!(value["safetySettings"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["threshold"] == "BLOCK_NONE"));
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "# Title\n"}, {"text": "Body"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("# Title\nBody"));
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "OTHER"}
        }))
        .unwrap();
        assert!(response.text().is_none());
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("OTHER")
        );
    }

    #[test]
    fn test_file_state_parsing() {
        let file: RemoteFile = serde_json::from_value(json!({
            "name": "files/abc",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc",
            "mimeType": "video/mp4",
            "state": "PROCESSING"
        }))
        .unwrap();
        assert_eq!(file.state, FileState::Processing);

        let file: RemoteFile =
            serde_json::from_value(json!({"name": "files/x", "state": "SOMETHING_NEW"})).unwrap();
        assert_eq!(file.state, FileState::Unknown);
    }
}
