//! In-process gateways and state for route tests.

use async_trait::async_trait;
use futures_util::stream;
use kreo_ollama::{ChatRequest, DeltaStream, ModelGateway, ModelInfo, OllamaClient, OllamaError};
use kreo_router::Orchestrator;
use kreo_search::SearchGateway;
use kreo_store::{ChatStore, KnowledgeBase};
use kreo_types::SearchResult;
use std::sync::Arc;

use crate::config::KreoConfig;
use crate::state::AppState;

/// Streams a fixed reply and answers every completion with "NO".
pub struct CannedModel {
    pub reply: Vec<&'static str>,
}

#[async_trait]
impl ModelGateway for CannedModel {
    async fn stream_chat(&self, _request: ChatRequest) -> Result<DeltaStream, OllamaError> {
        let chunks: Vec<Result<String, OllamaError>> =
            self.reply.iter().map(|c| Ok(c.to_string())).collect();
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn complete(&self, _request: ChatRequest) -> Result<String, OllamaError> {
        Ok("NO".to_string())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, OllamaError> {
        Ok(Vec::new())
    }

    async fn warm(&self, _model: &str) -> Result<(), OllamaError> {
        Ok(())
    }
}

/// Returns one result naming the query.
pub struct EchoSearch;

#[async_trait]
impl SearchGateway for EchoSearch {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        vec![SearchResult::new(
            format!("About {}", query),
            "https://example.com",
            format!("{} explained", query),
        )]
    }
}

/// State backed by in-memory stores and an unreachable Ollama.
pub fn test_state() -> AppState {
    let orchestrator = Orchestrator::new(
        Arc::new(CannedModel {
            reply: vec!["Hello", " there"],
        }),
        Arc::new(EchoSearch),
        Arc::new(ChatStore::in_memory()),
        Arc::new(KnowledgeBase::in_memory()),
    );
    AppState::from_parts(
        KreoConfig::default(),
        OllamaClient::with_url("http://127.0.0.1:9"),
        orchestrator,
    )
}
