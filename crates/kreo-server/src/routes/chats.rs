//! Chat history endpoints and the streaming turn endpoint.

use async_stream::stream;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::Local;
use futures_util::Stream;
use kreo_router::{TurnEvent, TurnRequest};
use kreo_store::ChatRepository;
use kreo_types::{Attachment, ChatRecord, ModelSettings, RecencyBucket};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::state::{ActiveTurns, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ChatGroup {
    bucket: RecencyBucket,
    label: &'static str,
    chats: Vec<ChatRecord>,
}

/// GET /api/chats - every chat, grouped by last update.
pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<ChatGroup>>, ServerError> {
    let groups = state
        .orchestrator
        .chats()
        .grouped(Local::now())?
        .into_iter()
        .map(|(bucket, chats)| ChatGroup {
            bucket,
            label: bucket.label(),
            chats,
        })
        .collect();
    Ok(Json(groups))
}

/// GET /api/chats/:id
pub(super) async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatRecord>, ServerError> {
    state
        .orchestrator
        .chats()
        .get(&id)?
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("chat '{}' not found", id)))
}

/// DELETE /api/chats/:id
pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    state.turns.stop(&id);
    if !state.orchestrator.chats().delete(&id)? {
        return Err(ServerError::NotFound(format!("chat '{}' not found", id)));
    }
    info!(chat_id = %id, "chat deleted");
    Ok(Json(json!({ "success": true })))
}

/// POST /api/chats/:id/stop - cancel the reply streaming into a chat.
pub(super) async fn stop(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let stopped = state.turns.stop(&id);
    debug!(chat_id = %id, stopped, "stop requested");
    Json(json!({ "stopped": stopped }))
}

#[derive(Debug, Deserialize)]
pub(super) struct TurnBody {
    #[serde(default, alias = "chatId")]
    chat_id: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    attachment: Option<Attachment>,
    #[serde(default)]
    settings: Option<ModelSettings>,
}

/// Forgets the turn and cancels it when the client goes away.
struct TurnLease {
    turns: Arc<ActiveTurns>,
    registered: Option<(String, u64)>,
    _cancel_on_drop: DropGuard,
}

impl Drop for TurnLease {
    fn drop(&mut self) {
        if let Some((id, generation)) = &self.registered {
            self.turns.remove(id, *generation);
        }
    }
}

/// POST /api/chat - run one turn, streaming its progress as server-sent
/// events named `chat`, `status`, `token`, `error` and `done`.
pub(super) async fn turn(
    State(state): State<AppState>,
    Json(body): Json<TurnBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServerError> {
    let mut settings = body
        .settings
        .unwrap_or_else(|| ModelSettings::default().with_model(state.config.default_model.as_str()));
    if settings.model.trim().is_empty() {
        settings.model = state.config.default_model.clone();
    }
    settings
        .validate()
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;
    if body.text.trim().is_empty() && body.attachment.is_none() {
        return Err(ServerError::BadRequest("message text or attachment is required".into()));
    }
    if let Some(id) = &body.chat_id {
        if state.orchestrator.chats().get(id)?.is_none() {
            return Err(ServerError::NotFound(format!("chat '{}' not found", id)));
        }
        if state.turns.is_active(id) {
            return Err(ServerError::Conflict(format!(
                "chat '{}' already has a response in progress",
                id
            )));
        }
    }

    let request = TurnRequest {
        chat_id: body.chat_id,
        text: body.text,
        attachment: body.attachment,
        settings,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let orchestrator = state.orchestrator.clone();
    let turn_cancel = cancel.clone();
    tokio::spawn(async move {
        match orchestrator.run_turn(request, &tx, turn_cancel).await {
            Ok(outcome) => debug!(
                chat_id = %outcome.chat_id,
                route = outcome.route.label(),
                side_tasks = outcome.background.len(),
                "turn complete"
            ),
            Err(e) => {
                warn!(error = %e, "turn failed");
                tx.send(TurnEvent::Error { message: e.to_string() }).ok();
            }
        }
    });

    let turns = state.turns.clone();
    let events = stream! {
        let mut lease = TurnLease {
            turns,
            registered: None,
            _cancel_on_drop: cancel.clone().drop_guard(),
        };
        while let Some(event) = rx.recv().await {
            if let TurnEvent::Chat { id } = &event {
                let generation = lease.turns.register(id, cancel.clone());
                lease.registered = Some((id.clone(), generation));
            }
            yield Ok(to_sse(&event));
        }
    };
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse(event: &TurnEvent) -> Event {
    Event::default()
        .event(event.name())
        .json_data(event)
        .unwrap_or_else(|_| Event::default().event("error").data("{}"))
}
