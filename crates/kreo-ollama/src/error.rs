//! Error types for model gateway operations.

use thiserror::Error;

/// Errors that can occur while talking to the inference runtime.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("Ollama API error: {0}")]
    Api(String),

    /// Server is not running or not reachable.
    #[error("Ollama server not running at {0}. Start it with: ollama serve")]
    ServerNotRunning(String),

    /// Model is not pulled locally.
    #[error("Model '{0}' not found. Pull it with: ollama pull {0}")]
    ModelNotFound(String),
}

impl OllamaError {
    /// Whether the runtime could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, OllamaError::ServerNotRunning(_) | OllamaError::Http(_))
    }
}
