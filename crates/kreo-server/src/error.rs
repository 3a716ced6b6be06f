//! Server error type.
//!
//! Handlers return `Result<T, ServerError>`; errors become a JSON
//! `{"error": ...}` body with a matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kreo_router::RouterError;
use kreo_store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Router(RouterError),

    /// The upstream model server could not be reached.
    #[error("Failed to connect to Ollama")]
    Upstream,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),
}

impl From<RouterError> for ServerError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::Store(e) => ServerError::Store(e),
            RouterError::ChatNotFound(_) => ServerError::NotFound(e.to_string()),
            RouterError::TurnInProgress(_) => ServerError::Conflict(e.to_string()),
            RouterError::EmptyTurn | RouterError::InvalidImage(_) | RouterError::Settings(_) => {
                ServerError::BadRequest(e.to_string())
            }
            other => ServerError::Router(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Store(_) | ServerError::Router(_) | ServerError::Upstream => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
