//! Request and response bodies of the Ollama chat API.

use kreo_types::ModelSettings;
use serde::{Deserialize, Serialize};

/// Stop sequences sent with every generation request.
const STOP_SEQUENCES: [&str; 4] = ["<|end|>", "<|eot_id|>", "</s>", "[END]"];

/// Token cap for streamed answers.
const ANSWER_NUM_PREDICT: i32 = 2048;

/// One message in a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl WireMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            images: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// Sampling options. Unset fields are left to the runtime's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl RequestOptions {
    /// Options for a full answer generated with the user's settings.
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            temperature: Some(settings.temperature),
            top_p: Some(settings.top_p),
            top_k: Some(settings.top_k),
            num_ctx: Some(settings.num_ctx),
            repeat_penalty: Some(settings.repeat_penalty),
            seed: settings.seed,
            num_predict: Some(ANSWER_NUM_PREDICT),
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Options for a short deterministic side request.
    pub fn short(temperature: f32, num_predict: i32) -> Self {
        Self {
            temperature: Some(temperature),
            num_predict: Some(num_predict),
            ..Default::default()
        }
    }
}

/// Constrained output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Json,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
    pub options: RequestOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            stream: false,
            options: RequestOptions::default(),
            format: None,
            keep_alive: None,
        }
    }

    /// Set the system prompt, placed before all other messages.
    pub fn system(mut self, prompt: impl Into<String>) -> Self {
        self.messages.retain(|m| m.role != "system");
        self.messages.insert(0, WireMessage::system(prompt));
        self
    }

    pub fn message(mut self, message: WireMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = WireMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn format(mut self, format: ResponseFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.keep_alive = Some(duration.into());
        self
    }
}

/// One line of a streamed reply, or the whole non-streamed reply.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkMessage {
    #[serde(default)]
    pub content: String,
}

/// A locally available model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// Response from `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}
