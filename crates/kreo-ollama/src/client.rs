//! HTTP client for a local Ollama server.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Instant;
use tracing::{debug, info};

use crate::decode::delta_stream;
use crate::error::OllamaError;
use crate::gateway::{DeltaStream, ModelGateway};
use crate::wire::{ChatChunk, ChatRequest, ModelInfo, RequestOptions, TagsResponse, WireMessage};
use crate::{DEFAULT_OLLAMA_URL, WARM_KEEP_ALIVE};

/// Ollama API client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client for the default local server.
    pub fn new() -> Self {
        Self::with_url(DEFAULT_OLLAMA_URL)
    }

    /// Create a client for a server at `base_url`.
    pub fn with_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> OllamaError {
        if e.is_connect() {
            OllamaError::ServerNotRunning(self.base_url.clone())
        } else {
            OllamaError::Http(e)
        }
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<reqwest::Response, OllamaError> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        check_status(response).await
    }

    /// Check if the server is running and `model` is pulled.
    pub async fn check_availability(&self, model: &str) -> Result<(), OllamaError> {
        let models = self.list_models().await?;
        let model_base = model.split(':').next().unwrap_or(model);

        let model_found = models
            .iter()
            .any(|m| m.name == model || m.name.starts_with(&format!("{}:", model_base)));

        if !model_found {
            return Err(OllamaError::ModelNotFound(model.to_string()));
        }
        Ok(())
    }

    /// Forward a raw chat body unchanged and hand back the live response.
    pub async fn forward_chat(&self, body: Vec<u8>) -> Result<reqwest::Response, OllamaError> {
        self.client
            .post(self.url("/api/chat"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))
    }

    /// Forward a model listing request and hand back the live response.
    pub async fn forward_tags(&self) -> Result<reqwest::Response, OllamaError> {
        self.client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, OllamaError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(OllamaError::Api(format!("{}: {}", status, text)))
}

#[async_trait]
impl ModelGateway for OllamaClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<DeltaStream, OllamaError> {
        let request = request.streaming(true);
        debug!(model = %request.model, messages = request.messages.len(), "starting chat stream");
        let response = self.post_chat(&request).await?;
        Ok(delta_stream(response.bytes_stream().boxed()))
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, OllamaError> {
        let request = request.streaming(false);
        let response = self.post_chat(&request).await?;
        let chunk: ChatChunk = serde_json::from_slice(&response.bytes().await?)?;

        if let Some(error) = chunk.error {
            return Err(OllamaError::Api(error));
        }
        Ok(chunk.message.map(|m| m.content).unwrap_or_default())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, OllamaError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|_| OllamaError::ServerNotRunning(self.base_url.clone()))?;

        if !response.status().is_success() {
            return Err(OllamaError::ServerNotRunning(self.base_url.clone()));
        }

        let tags: TagsResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(tags.models)
    }

    async fn warm(&self, model: &str) -> Result<(), OllamaError> {
        let started = Instant::now();
        let request = ChatRequest::new(model)
            .message(WireMessage::user("hi"))
            .options(RequestOptions::short(0.0, 1))
            .keep_alive(WARM_KEEP_ALIVE);
        self.complete(request).await?;
        info!(model, elapsed_ms = started.elapsed().as_millis() as u64, "model warmed up");
        Ok(())
    }
}
