//! Shared application state injected into every handler.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info;

use kreo_ollama::OllamaClient;
use kreo_router::Orchestrator;
use kreo_search::DuckDuckGo;
use kreo_store::{paths, ChatStore, KnowledgeBase, StoreError};

use crate::config::KreoConfig;
use crate::error::ServerError;

/// Cancellation tokens of the turns currently streaming, keyed by chat id.
///
/// Each registration gets a generation so a finished turn only forgets its
/// own entry.
#[derive(Debug, Default)]
pub struct ActiveTurns {
    tokens: Mutex<HashMap<String, (u64, CancellationToken)>>,
    generation: AtomicU64,
}

impl ActiveTurns {
    /// Track `token` for `chat_id`, replacing any previous turn. Returns the
    /// generation to hand back to [`ActiveTurns::remove`].
    pub fn register(&self, chat_id: &str, token: CancellationToken) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(chat_id.to_string(), (generation, token));
        }
        generation
    }

    /// Cancel the turn streaming into `chat_id`. Returns `true` if one was found.
    pub fn stop(&self, chat_id: &str) -> bool {
        match self.tokens.lock() {
            Ok(tokens) => match tokens.get(chat_id) {
                Some((_, token)) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Forget the turn registered as `generation`. A newer turn on the same
    /// chat is left alone.
    pub fn remove(&self, chat_id: &str, generation: u64) {
        if let Ok(mut tokens) = self.tokens.lock() {
            if tokens.get(chat_id).is_some_and(|(g, _)| *g == generation) {
                tokens.remove(chat_id);
            }
        }
    }

    pub fn is_active(&self, chat_id: &str) -> bool {
        self.tokens
            .lock()
            .map(|tokens| tokens.contains_key(chat_id))
            .unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<KreoConfig>,
    /// Raw client for the passthrough routes.
    pub ollama: OllamaClient,
    pub orchestrator: Arc<Orchestrator>,
    pub turns: Arc<ActiveTurns>,
}

impl AppState {
    /// Open the stores under the configured data directory and wire up the
    /// gateways.
    pub fn open(config: KreoConfig) -> Result<Self, ServerError> {
        paths::ensure_dir(&config.data_dir).map_err(|source| StoreError::Io {
            path: config.data_dir.clone(),
            source,
        })?;
        let chats = ChatStore::open(paths::chats_path(&config.data_dir))?;
        let knowledge = KnowledgeBase::open(paths::knowledge_path(&config.data_dir))?;
        info!(data_dir = %config.data_dir.display(), "stores opened");

        let ollama = OllamaClient::with_url(config.ollama_url.as_str());
        let search = DuckDuckGo::new().with_search_timeout(config.search_timeout);
        let orchestrator = Orchestrator::new(
            Arc::new(ollama.clone()),
            Arc::new(search),
            Arc::new(chats),
            Arc::new(knowledge),
        );
        Ok(Self::from_parts(config, ollama, orchestrator))
    }

    pub fn from_parts(config: KreoConfig, ollama: OllamaClient, orchestrator: Orchestrator) -> Self {
        Self {
            config: Arc::new(config),
            ollama,
            orchestrator: Arc::new(orchestrator),
            turns: Arc::new(ActiveTurns::default()),
        }
    }
}
