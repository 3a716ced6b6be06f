//! Web search endpoints.

use axum::extract::{Query, State};
use axum::Json;
use kreo_search::SearchGateway;
use kreo_types::SearchResult;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchBody {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchResponse {
    results: Vec<SearchResult>,
}

/// GET /api/search?q=
pub(super) async fn search_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ServerError> {
    let query = params.q.unwrap_or_default();
    run(&state, &query, "Query parameter \"q\" is required").await
}

/// POST /api/web-search {query}
pub(super) async fn search_post(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResponse>, ServerError> {
    run(&state, &body.query, "Query is required").await
}

async fn run(state: &AppState, query: &str, missing: &str) -> Result<Json<SearchResponse>, ServerError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ServerError::BadRequest(missing.to_string()));
    }
    let results = state.orchestrator.search().search(query).await;
    Ok(Json(SearchResponse { results }))
}
