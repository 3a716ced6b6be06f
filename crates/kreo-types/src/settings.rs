//! Model generation settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from settings validation.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("model name must not be empty")]
    EmptyModel,
}

/// Per-request generation settings chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub num_ctx: u32,
    pub repeat_penalty: f32,
    pub seed: Option<i64>,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,
    #[serde(rename = "userName")]
    pub user_name: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gemma3:4b".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            num_ctx: 4096,
            repeat_penalty: 1.1,
            seed: Some(42),
            system_prompt: "You are a helpful AI assistant.".to_string(),
            user_name: "User".to_string(),
        }
    }
}

impl ModelSettings {
    /// Check numeric ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.model.trim().is_empty() {
            return Err(SettingsError::EmptyModel);
        }
        check("temperature", self.temperature as f64, 0.0, 2.0)?;
        check("top_p", self.top_p as f64, 0.0, 1.0)?;
        check("top_k", self.top_k as f64, 1.0, 100.0)?;
        check("num_ctx", self.num_ctx as f64, 512.0, 131_072.0)?;
        check("repeat_penalty", self.repeat_penalty as f64, 0.5, 2.0)?;
        Ok(())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

fn check(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), SettingsError> {
    if value < min || value > max {
        return Err(SettingsError::OutOfRange {
            name,
            min,
            max,
            value,
        });
    }
    Ok(())
}
