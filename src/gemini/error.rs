//! Error types for the Gemini client.

use thiserror::Error;

/// Gemini client errors.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response, quota, invalid request)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Local I/O while reading an upload payload
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
