//! Error types for turn orchestration.

use kreo_ollama::OllamaError;
use kreo_store::StoreError;
use kreo_types::SettingsError;
use thiserror::Error;

/// Errors that stop a turn before or outside streaming.
///
/// Failures of the model stream itself are reported inside the assistant
/// message, not through this type.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("model error: {0}")]
    Model(#[from] OllamaError),

    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("chat '{0}' not found")]
    ChatNotFound(String),

    #[error("chat '{0}' already has a response in progress")]
    TurnInProgress(String),

    #[error("turn has neither text nor attachment")]
    EmptyTurn,

    #[error("image attachment is not valid base64: {0}")]
    InvalidImage(String),
}
