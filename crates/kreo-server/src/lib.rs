//! # Kreo Server
//!
//! HTTP backend for the Kreo web client:
//!
//! - `/ollama/*` passes chat and model listing straight through to Ollama.
//! - `/api/search` and `/api/web-search` run DuckDuckGo searches.
//! - `/api/knowledge/*` teaches and recalls knowledge entries.
//! - `/api/chats` and `/api/chat` manage chat history and run routed turns,
//!   streamed as server-sent events.

pub mod config;
pub mod error;
mod routes;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, KreoConfig, KreoConfigBuilder};
pub use error::ServerError;
pub use routes::router;
pub use state::{ActiveTurns, AppState};

use kreo_ollama::ModelGateway;
use tracing::{info, warn};

/// Open the stores, optionally warm the default model, and serve until the
/// process is stopped.
pub async fn serve(config: KreoConfig) -> std::io::Result<()> {
    let bind = config.bind;
    let warm = config.warm_on_start;
    let state = AppState::open(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    if warm {
        let ollama = state.ollama.clone();
        let model = state.config.default_model.clone();
        tokio::spawn(async move {
            match ollama.warm(&model).await {
                Ok(()) => info!(model = %model, "model warmed up"),
                Err(e) => warn!(model = %model, error = %e, "model warm-up failed"),
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %bind, "kreo backend listening");
    axum::serve(listener, router(state)).await
}
