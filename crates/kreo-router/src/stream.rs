//! Relaying a model stream into the assistant message.

use futures_util::StreamExt;
use kreo_ollama::{DeltaStream, OllamaError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Marker appended once to a reply the user stopped.
pub const STOPPED_MARKER: &str = " _[Stopped]_";

/// Content shown in place of a reply that failed.
pub fn error_content(error: &OllamaError) -> String {
    format!("**Error:** {}. Make sure Ollama is running.", error)
}

/// How a relayed stream ended.
#[derive(Debug)]
pub enum RelayOutcome {
    /// The model finished. Holds the full text.
    Completed(String),
    /// The user cancelled. Holds the text received so far.
    Cancelled(String),
    /// The stream broke. Holds the partial text and the cause.
    Failed { partial: String, error: OllamaError },
}

impl RelayOutcome {
    /// Final message content for this outcome.
    pub fn content(&self) -> String {
        match self {
            RelayOutcome::Completed(text) => text.clone(),
            RelayOutcome::Cancelled(text) => format!("{}{}", text, STOPPED_MARKER),
            RelayOutcome::Failed { error, .. } => error_content(error),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Completed(_) => "completed",
            RelayOutcome::Cancelled(_) => "cancelled",
            RelayOutcome::Failed { .. } => "failed",
        }
    }
}

/// Drive `stream` to its end, handing every delta to `on_delta`.
///
/// Cancellation is checked before each delta is applied, so no delta lands
/// after `cancel` fires. Returning drops the stream, which aborts the
/// underlying request.
pub async fn relay(
    mut stream: DeltaStream,
    cancel: &CancellationToken,
    mut on_delta: impl FnMut(&str) + Send,
) -> RelayOutcome {
    let mut text = String::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(chars = text.len(), "generation stopped by user");
                return RelayOutcome::Cancelled(text);
            }
            next = stream.next() => match next {
                Some(Ok(delta)) => {
                    if cancel.is_cancelled() {
                        return RelayOutcome::Cancelled(text);
                    }
                    text.push_str(&delta);
                    on_delta(&delta);
                }
                Some(Err(error)) => {
                    warn!(error = %error, "model stream failed");
                    return RelayOutcome::Failed { partial: text, error };
                }
                None => return RelayOutcome::Completed(text),
            }
        }
    }
}
