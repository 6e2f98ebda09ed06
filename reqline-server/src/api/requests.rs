//! Request submission and the DJ dashboard list/archive API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use reqline_common::db::models::{RequestKind, SubmittedRequest};

use crate::queue::{self, SortMode};
use crate::{sse, AppState};

/// Body for POST /api/requests (untipped submissions only)
#[derive(Debug, Deserialize)]
pub struct SubmitRequestBody {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub content: String,
    pub title: Option<String>,
    #[serde(default)]
    pub tip: i64,
}

#[derive(Debug, Serialize)]
pub struct SubmitRequestResponse {
    pub id: String,
}

/// POST /api/requests
///
/// Direct write for untipped requests; tipped submissions must go through
/// the payment session flow, which is the only path into the pending store.
pub async fn submit_request(
    State(state): State<AppState>,
    Json(body): Json<SubmitRequestBody>,
) -> Result<(StatusCode, Json<SubmitRequestResponse>), RequestError> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(RequestError::EmptyContent);
    }
    if body.tip != 0 {
        return Err(RequestError::TippedSubmission);
    }

    let request = queue::insert_request(&state.db, body.kind, content, body.title.as_deref(), 0)
        .await
        .map_err(RequestError::internal)?;

    if let Err(e) = sse::broadcast_queue(&state.db, &state.broadcaster).await {
        error!(error = %e, "Failed to broadcast queue after submission");
    }

    Ok((StatusCode::CREATED, Json(SubmitRequestResponse { id: request.id })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
}

/// GET /api/queue?sort=time|tip (DJ only)
///
/// Archived rows filtered out, then sorted per the requested mode.
pub async fn list_requests(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<SubmittedRequest>>, RequestError> {
    let requests = queue::fetch_all(&state.db)
        .await
        .map_err(RequestError::internal)?;
    let sort = SortMode::parse(params.sort.as_deref());
    Ok(Json(queue::dashboard_view(&requests, sort)))
}

/// POST /api/queue/:id/archive (DJ only)
///
/// Fire-and-forget from the dashboard's point of view: the response only
/// acknowledges the status flip; the updated queue arrives over the live
/// feed like any other change.
pub async fn archive_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    let archived = queue::archive(&state.db, &id)
        .await
        .map_err(RequestError::internal)?;

    if !archived {
        return Err(RequestError::NotFound(id));
    }

    if let Err(e) = sse::broadcast_queue(&state.db, &state.broadcaster).await {
        error!(error = %e, "Failed to broadcast queue after archive");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Request handler error types
#[derive(Debug)]
pub enum RequestError {
    EmptyContent,
    TippedSubmission,
    NotFound(String),
    Internal(String),
}

impl RequestError {
    fn internal(e: reqline_common::Error) -> Self {
        RequestError::Internal(e.to_string())
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RequestError::EmptyContent => (
                StatusCode::BAD_REQUEST,
                "Request content must not be empty".to_string(),
            ),
            RequestError::TippedSubmission => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Tipped requests must use the payment session flow".to_string(),
            ),
            RequestError::NotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Unknown request: {}", id))
            }
            RequestError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
