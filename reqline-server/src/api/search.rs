//! Catalog search endpoint

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::search::SearchResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/search?q=...
///
/// Runs the provider fallback chain and returns normalized results.
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, SearchApiError> {
    let term = params.q.as_deref().map(str::trim).unwrap_or("");
    if term.is_empty() {
        return Err(SearchApiError::MissingTerm);
    }

    let results = state
        .search
        .search(term)
        .await
        .map_err(|e| SearchApiError::Upstream(e.to_string()))?;

    Ok(Json(results))
}

/// Search endpoint error types
#[derive(Debug)]
pub enum SearchApiError {
    MissingTerm,
    Upstream(String),
}

impl IntoResponse for SearchApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SearchApiError::MissingTerm => {
                (StatusCode::BAD_REQUEST, "Missing search term".to_string())
            }
            // All providers down; the client may simply retry
            SearchApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(json!({ "error": message, "results": [] }))).into_response()
    }
}
