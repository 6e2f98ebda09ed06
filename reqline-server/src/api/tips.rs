//! Tip payment endpoints: session initiation and the redirect return
//!
//! Flow for a tipped request: the pending record is stored first, then a
//! payment session is requested from the external intent service. A failed
//! initiation leaves the pending record behind on purpose - the client
//! retries with the same request id and the idempotent put prevents any
//! duplicate. The redirect return runs the claim-and-commit state machine.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use reqline_common::db::models::{PendingTipRequest, RequestKind};
use reqline_common::time;

use crate::confirm::{self, ConfirmErrorKind, ConfirmOutcome, PaymentReturn};
use crate::payment::{self, PaymentError};
use crate::{pending, sse, AppState};

/// Fixed return path the hosted payment flow redirects back to
pub const RETURN_PATH: &str = "/payment/complete";

/// Body for POST /api/tips/session
#[derive(Debug, Deserialize)]
pub struct TipSessionBody {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub content: String,
    pub title: Option<String>,
    pub tip: i64,
    /// Client-generated id; the server assigns one when absent. Retries of
    /// a failed initiation should resend the id they were issued.
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TipSessionResponse {
    pub client_secret: String,
    pub request_id: String,
    /// Return address with the request id embedded, so the confirmation
    /// handler can locate the pending record after the redirect
    pub return_path: String,
}

/// POST /api/tips/session
pub async fn create_tip_session(
    State(state): State<AppState>,
    Json(body): Json<TipSessionBody>,
) -> Result<Json<TipSessionResponse>, TipError> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(TipError::EmptyContent);
    }
    payment::validate_tip_amount(body.tip)?;

    let request_id = body
        .request_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Pending record goes in before the session is requested; the session
    // initiator itself never writes state
    pending::put(
        &state.db,
        &PendingTipRequest {
            request_id: request_id.clone(),
            kind: body.kind,
            content: content.to_string(),
            title: body.title.clone(),
            tip: body.tip,
            created_at: time::now_ms(),
        },
    )
    .await
    .map_err(|e| TipError::Internal(e.to_string()))?;

    let client = state.payment.as_ref().ok_or(TipError::NotConfigured)?;
    let client_secret = client.create_intent(body.tip).await?;

    Ok(Json(TipSessionResponse {
        client_secret,
        request_id: request_id.clone(),
        return_path: format!("{}?requestId={}", RETURN_PATH, request_id),
    }))
}

/// GET /payment/complete?redirect_status=...&requestId=...
///
/// The browser lands here after the hosted payment flow. Each invocation
/// runs the confirmation state machine to a terminal outcome.
pub async fn payment_return(
    State(state): State<AppState>,
    Query(params): Query<PaymentReturn>,
) -> Response {
    let outcome = confirm::process_payment_return(&state.db, &params).await;

    if outcome == ConfirmOutcome::Success {
        if let Err(e) = sse::broadcast_queue(&state.db, &state.broadcaster).await {
            error!(error = %e, "Failed to broadcast queue after payment commit");
        }
    }

    let status = match &outcome {
        ConfirmOutcome::Success | ConfirmOutcome::AlreadyProcessed => StatusCode::OK,
        ConfirmOutcome::Failed | ConfirmOutcome::Unknown => StatusCode::OK,
        ConfirmOutcome::Error {
            kind: ConfirmErrorKind::MissingRequestId,
            ..
        } => StatusCode::BAD_REQUEST,
        ConfirmOutcome::Error {
            kind: ConfirmErrorKind::CommitFailed,
            ..
        } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(outcome)).into_response()
}

/// Tip session error types
#[derive(Debug)]
pub enum TipError {
    EmptyContent,
    Payment(PaymentError),
    NotConfigured,
    Internal(String),
}

impl From<PaymentError> for TipError {
    fn from(e: PaymentError) -> Self {
        TipError::Payment(e)
    }
}

impl IntoResponse for TipError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TipError::EmptyContent => (
                StatusCode::BAD_REQUEST,
                "Request content must not be empty".to_string(),
            ),
            TipError::Payment(PaymentError::InvalidAmount(amount)) => (
                StatusCode::BAD_REQUEST,
                format!("Tip must be between 1 and 999, got {}", amount),
            ),
            // Transient upstream failures are retryable; the pending record
            // survives for the retry
            TipError::Payment(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            TipError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Payment service not configured".to_string(),
            ),
            TipError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
