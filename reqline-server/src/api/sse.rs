//! Server-Sent Events endpoint for the dashboard live feed

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /api/events - live request feed (DJ only)
///
/// Streams `queue_changed` snapshots; delivery stops the moment the client
/// disconnects.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.broadcaster.handle_sse_connection()
}
