//! Payment confirmation handling
//!
//! Runs when the browser returns from the hosted payment flow. Resolves the
//! redirect outcome and performs the claim-and-commit: atomically claim the
//! pending record, then write it into the request queue exactly once.
//!
//! Claim-then-commit rather than commit-then-delete: "first to delete wins"
//! serializes concurrent invocations (same-tab replays, a second tab on the
//! same redirect URL) without any lock. The cost is that a commit failure
//! after a successful claim is terminal - the record is already gone and the
//! path cannot be retried. At-most-once delivery is preferred over
//! retry-ability here; a duplicate submission after a real charge is judged
//! worse than an occasional manual recovery.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::queue;

/// Redirect parameters from the hosted payment flow return address
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentReturn {
    pub redirect_status: Option<String>,
    #[serde(rename = "requestId")]
    pub request_id: Option<String>,
}

/// What went wrong inside an `Error` outcome; drives the HTTP status
/// mapping without inspecting the user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmErrorKind {
    /// Succeeded redirect arrived without a usable request id
    MissingRequestId,
    /// Claim or commit failed against the store
    CommitFailed,
}

/// Terminal state of one confirmation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmOutcome {
    /// Claimed the pending record and committed it to the queue
    Success,
    /// Record already consumed - an earlier or concurrent invocation
    /// committed it. Presented to the user exactly like success; after a
    /// succeeded payment, "absent" never implies a duplicate charge.
    AlreadyProcessed,
    /// Provider reported the payment as failed; nothing touched
    Failed,
    /// Provider status missing or unrecognized; nothing touched
    Unknown,
    /// Succeeded payment that could not be committed
    Error {
        #[serde(skip)]
        kind: ConfirmErrorKind,
        message: String,
    },
}

/// Process one return from the hosted payment flow
///
/// Always runs to a terminal state; the payment is externally committed by
/// the time this is invoked, so there is no cancellation path.
pub async fn process_payment_return(pool: &SqlitePool, params: &PaymentReturn) -> ConfirmOutcome {
    match params.redirect_status.as_deref() {
        Some("succeeded") => {}
        Some("failed") => {
            info!("Payment redirect reported failure; pending record left in place");
            return ConfirmOutcome::Failed;
        }
        other => {
            warn!(status = ?other, "Unrecognized payment redirect status");
            return ConfirmOutcome::Unknown;
        }
    }

    let request_id = match params.request_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => {
            warn!("Succeeded payment redirect without a request id");
            return ConfirmOutcome::Error {
                kind: ConfirmErrorKind::MissingRequestId,
                message: "missing request id".to_string(),
            };
        }
    };

    // Atomic claim: first invocation to delete the record wins the commit
    let pending = match crate::pending::claim(pool, request_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            info!(request_id, "Pending record already claimed");
            return ConfirmOutcome::AlreadyProcessed;
        }
        Err(e) => {
            error!(request_id, error = %e, "Claim failed");
            return ConfirmOutcome::Error {
                kind: ConfirmErrorKind::CommitFailed,
                message: "failed to submit request, contact DJ".to_string(),
            };
        }
    };

    match queue::insert_request(
        pool,
        pending.kind,
        &pending.content,
        pending.title.as_deref(),
        pending.tip,
    )
    .await
    {
        Ok(request) => {
            info!(request_id, queue_id = %request.id, tip = request.tip, "Tipped request committed");
            ConfirmOutcome::Success
        }
        Err(e) => {
            // The claim already consumed the record; nothing to retry against
            error!(request_id, error = %e, "Commit failed after claim");
            ConfirmOutcome::Error {
                kind: ConfirmErrorKind::CommitFailed,
                message: "failed to submit request, contact DJ".to_string(),
            }
        }
    }
}
