//! SSE event types for the live request feed

use crate::db::models::SubmittedRequest;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// SSE event wrapper for transmission
#[derive(Debug, Clone, Serialize)]
pub struct SseEvent {
    /// Event type name
    pub event: String,

    /// Event data (JSON)
    pub data: SseEventData,

    /// Event ID for client reconnection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SseEvent {
    /// Create a new SSE event
    pub fn new(event: &str, data: SseEventData) -> Self {
        Self {
            event: event.to_string(),
            data,
            id: Some(Uuid::new_v4().to_string()),
        }
    }
}

/// SSE event data variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SseEventData {
    /// Queue contents changed; carries the full snapshot in store order
    /// (timestamp descending), including archived rows - clients filter
    QueueChanged {
        requests: Vec<SubmittedRequest>,
        count: usize,
        timestamp: u64,
    },

    /// Keep-alive ping
    KeepAlive { timestamp: u64 },
}

impl SseEventData {
    /// Get current timestamp in milliseconds since UNIX epoch
    fn current_timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// Create QueueChanged event
    pub fn queue_changed(requests: Vec<SubmittedRequest>) -> Self {
        let count = requests.len();
        Self::QueueChanged {
            requests,
            count,
            timestamp: Self::current_timestamp_ms(),
        }
    }

    /// Create KeepAlive event
    pub fn keep_alive() -> Self {
        Self::KeepAlive {
            timestamp: Self::current_timestamp_ms(),
        }
    }
}
