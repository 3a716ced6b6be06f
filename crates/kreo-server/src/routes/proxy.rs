//! Transparent passthrough to the Ollama HTTP API.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::error::ServerError;
use crate::state::AppState;

/// POST /ollama/api/chat - forwards the body and streams the reply back as it
/// arrives.
pub(super) async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ServerError> {
    debug!(bytes = body.len(), "forwarding chat request");
    let upstream = state.ollama.forward_chat(body.to_vec()).await.map_err(|e| {
        warn!(error = %e, "ollama chat passthrough failed");
        ServerError::Upstream
    })?;
    Ok(relay(upstream, "application/x-ndjson"))
}

/// GET /ollama/api/tags
pub(super) async fn tags(State(state): State<AppState>) -> Result<Response, ServerError> {
    let upstream = state.ollama.forward_tags().await.map_err(|e| {
        warn!(error = %e, "ollama tags passthrough failed");
        ServerError::Upstream
    })?;
    Ok(relay(upstream, "application/json"))
}

fn relay(upstream: reqwest::Response, content_type: &'static str) -> Response {
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = Body::from_stream(upstream.bytes_stream());
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}
