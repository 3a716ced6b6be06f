//! Seam between orchestration and the inference runtime.

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

use crate::error::OllamaError;
use crate::wire::{ChatRequest, ModelInfo};

/// Content deltas of a streamed reply, in arrival order.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, OllamaError>> + Send>>;

/// Access to a local chat model.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Start a streamed generation. Dropping the stream aborts it.
    async fn stream_chat(&self, request: ChatRequest) -> Result<DeltaStream, OllamaError>;

    /// Run a generation to completion and return the full text.
    async fn complete(&self, request: ChatRequest) -> Result<String, OllamaError>;

    /// Models available to the runtime.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, OllamaError>;

    /// Load `model` into memory so the first real turn starts faster.
    async fn warm(&self, model: &str) -> Result<(), OllamaError>;
}
