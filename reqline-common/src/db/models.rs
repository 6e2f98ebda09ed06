//! Database models

use serde::{Deserialize, Serialize};

/// How a request identifies its song: a pasted link or a catalog search pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestKind {
    Link,
    Search,
}

/// Lifecycle of a submitted request
///
/// Requests are never hard-deleted; the DJ flips them to `Archived` and the
/// dashboard filters them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Archived,
}

/// A request in the shared queue, observed live by the DJ dashboard
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubmittedRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub content: String,
    pub title: Option<String>,
    pub tip: i64,
    pub status: RequestStatus,
    /// Server-assigned epoch ms; absent rows sort as epoch zero
    pub timestamp: Option<i64>,
}

/// A not-yet-confirmed tip request, held until the payment redirect claims it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingTipRequest {
    pub request_id: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub content: String,
    pub title: Option<String>,
    pub tip: i64,
    pub created_at: i64,
}

/// A booking inquiry from the public site
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub contact_preference: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_range: Option<String>,
    pub event_type: Option<String>,
    pub status: String,
    pub timestamp: Option<i64>,
}

/// Settings table row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}
