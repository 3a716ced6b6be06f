//! Knowledge base endpoints.

use axum::extract::{Query, State};
use axum::Json;
use kreo_store::{KnowledgeStore, StoreError};
use kreo_types::KnowledgeEntry;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct RecallParams {
    #[serde(default)]
    query: String,
}

/// GET /api/knowledge/search?query=
pub(super) async fn search(
    State(state): State<AppState>,
    Query(params): Query<RecallParams>,
) -> Result<Json<Vec<KnowledgeEntry>>, ServerError> {
    let hits = state.orchestrator.knowledge().search(&params.query)?;
    Ok(Json(hits.into_iter().map(|hit| hit.entry).collect()))
}

#[derive(Debug, Deserialize)]
pub(super) struct LearnBody {
    question: String,
    answer: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LearnResponse {
    success: bool,
    entry: KnowledgeEntry,
}

/// POST /api/knowledge/learn {question, answer}
pub(super) async fn learn(
    State(state): State<AppState>,
    Json(body): Json<LearnBody>,
) -> Result<Json<LearnResponse>, ServerError> {
    let entry = state
        .orchestrator
        .knowledge()
        .learn(&body.question, &body.answer)
        .map_err(|e| match e {
            StoreError::EmptyEntry => ServerError::BadRequest(e.to_string()),
            other => ServerError::Store(other),
        })?;
    info!(question = %entry.question, "knowledge entry taught");
    Ok(Json(LearnResponse {
        success: true,
        entry,
    }))
}
