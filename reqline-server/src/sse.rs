//! SSE broadcaster for the live request feed

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use sqlx::SqlitePool;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use reqline_common::events::{SseEvent, SseEventData};
use reqline_common::Result;

use crate::queue;

/// Broadcaster managing dashboard connections and queue-change distribution
#[derive(Clone)]
pub struct QueueBroadcaster {
    tx: broadcast::Sender<SseEvent>,
}

impl QueueBroadcaster {
    /// Create a new broadcaster
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer per lagging client
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event, ignoring if no dashboard is connected
    pub fn broadcast_lossy(&self, event: SseEvent) {
        let count = self.tx.receiver_count();
        let _ = self.tx.send(event);
        debug!("Broadcast queue event to {} clients", count);
    }

    /// Get current number of connected clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Subscribe to raw events (used by tests and the SSE stream)
    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.tx.subscribe()
    }

    /// Create an SSE stream for a new dashboard connection
    ///
    /// Dropping the stream (client disconnect, dashboard teardown) drops the
    /// broadcast receiver, which stops delivery immediately.
    pub fn subscribe_stream(&self) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
        BroadcastStream::new(self.subscribe()).filter_map(|received| async move {
            let sse_event = match received {
                Ok(sse_event) => sse_event,
                Err(e) => {
                    // Lagged receiver. Every queue event carries the full
                    // snapshot, so the next one supersedes whatever was missed
                    warn!(error = ?e, "Dashboard feed receiver lagged; waiting for next snapshot");
                    return None;
                }
            };

            Event::default()
                .event(&sse_event.event)
                .json_data(&sse_event.data)
                .ok()
                .map(Ok)
        })
    }

    /// Create an Axum SSE response for GET /api/events
    pub fn handle_sse_connection(
        &self,
    ) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
        info!("Dashboard joined the live feed ({} now watching)", self.client_count() + 1);

        Sse::new(self.subscribe_stream())
            .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
    }
}

/// Push the current queue snapshot to every connected dashboard
///
/// Called after each queue mutation. The snapshot is the store's own order
/// (timestamp descending); consumers filter archived rows themselves.
pub async fn broadcast_queue(pool: &SqlitePool, broadcaster: &QueueBroadcaster) -> Result<()> {
    let requests = queue::fetch_all(pool).await?;
    broadcaster.broadcast_lossy(SseEvent::new(
        "queue_changed",
        SseEventData::queue_changed(requests),
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let broadcaster = QueueBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();

        broadcaster.broadcast_lossy(SseEvent::new(
            "queue_changed",
            SseEventData::queue_changed(vec![]),
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "queue_changed");
    }

    #[tokio::test]
    async fn test_dropped_subscriber_stops_counting() {
        let broadcaster = QueueBroadcaster::new(8);
        assert_eq!(broadcaster.client_count(), 0);

        let rx = broadcaster.subscribe();
        assert_eq!(broadcaster.client_count(), 1);

        drop(rx);
        assert_eq!(broadcaster.client_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_without_clients_is_ok() {
        let broadcaster = QueueBroadcaster::new(8);
        // No receiver connected; must not error or panic
        broadcaster.broadcast_lossy(SseEvent::new(
            "queue_changed",
            SseEventData::queue_changed(vec![]),
        ));
    }
}
