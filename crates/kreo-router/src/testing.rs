//! Scripted gateways for router tests.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use kreo_ollama::{ChatRequest, DeltaStream, ModelGateway, ModelInfo, OllamaError};
use kreo_search::SearchGateway;
use kreo_types::SearchResult;
use std::collections::VecDeque;
use std::sync::Mutex;

enum StreamEnd {
    Done,
    Error(String),
    Hang,
}

/// Model that replays canned completions and stream chunks.
pub struct ScriptedModel {
    completions: Mutex<VecDeque<String>>,
    chunks: Vec<String>,
    end: StreamEnd,
    failing: bool,
    requests: Mutex<Vec<ChatRequest>>,
    complete_calls: Mutex<usize>,
    stream_calls: Mutex<usize>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self {
            completions: Mutex::new(VecDeque::new()),
            chunks: Vec::new(),
            end: StreamEnd::Done,
            failing: false,
            requests: Mutex::new(Vec::new()),
            complete_calls: Mutex::new(0),
            stream_calls: Mutex::new(0),
        }
    }
}

impl ScriptedModel {
    /// Queue a completion; once the queue is empty completions are empty.
    pub fn with_completion(self, text: &str) -> Self {
        self.completions.lock().unwrap().push_back(text.to_string());
        self
    }

    pub fn with_stream(mut self, chunks: &[&str]) -> Self {
        self.chunks = chunks.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Stream the chunks, then fail.
    pub fn with_stream_error(mut self, message: &str) -> Self {
        self.end = StreamEnd::Error(message.to_string());
        self
    }

    /// Stream the chunks, then never finish.
    pub fn hanging(mut self) -> Self {
        self.end = StreamEnd::Hang;
        self
    }

    /// Every call fails as if the server were down.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn complete_calls(&self) -> usize {
        *self.complete_calls.lock().unwrap()
    }

    pub fn stream_calls(&self) -> usize {
        *self.stream_calls.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn record(&self, request: ChatRequest) -> Result<(), OllamaError> {
        self.requests.lock().unwrap().push(request);
        if self.failing {
            return Err(OllamaError::ServerNotRunning("http://localhost:11434".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ModelGateway for ScriptedModel {
    async fn stream_chat(&self, request: ChatRequest) -> Result<DeltaStream, OllamaError> {
        *self.stream_calls.lock().unwrap() += 1;
        self.record(request)?;

        let chunks: Vec<Result<String, OllamaError>> =
            self.chunks.iter().cloned().map(Ok).collect();
        let body = stream::iter(chunks);
        let stream: DeltaStream = match &self.end {
            StreamEnd::Done => Box::pin(body),
            StreamEnd::Error(msg) => {
                let err = OllamaError::Api(msg.clone());
                Box::pin(body.chain(stream::once(async move { Err(err) })))
            }
            StreamEnd::Hang => Box::pin(body.chain(stream::pending())),
        };
        Ok(stream)
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, OllamaError> {
        *self.complete_calls.lock().unwrap() += 1;
        self.record(request)?;
        Ok(self.completions.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, OllamaError> {
        Ok(vec![ModelInfo {
            name: "test-model".into(),
            size: 1,
        }])
    }

    async fn warm(&self, _model: &str) -> Result<(), OllamaError> {
        Ok(())
    }
}

/// Search engine returning fixed results and recording queries.
#[derive(Default)]
pub struct ScriptedSearch {
    results: Vec<SearchResult>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchGateway for ScriptedSearch {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        self.queries.lock().unwrap().push(query.to_string());
        self.results.clone()
    }
}
