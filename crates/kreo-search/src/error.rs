use thiserror::Error;

/// Errors from a search backend. Never escapes [`crate::SearchGateway`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search endpoint returned {0}")]
    Status(reqwest::StatusCode),
}
