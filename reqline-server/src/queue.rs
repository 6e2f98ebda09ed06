//! Request queue access and dashboard ordering

use reqline_common::db::models::{RequestKind, RequestStatus, SubmittedRequest};
use reqline_common::{time, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Dashboard sort modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Most recent first; rows without a timestamp sort as epoch zero
    #[default]
    Time,
    /// Highest tip first; feed order breaks ties
    Tip,
}

impl SortMode {
    /// Parse the `sort` query parameter; anything unrecognized means recency
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("tip") => SortMode::Tip,
            _ => SortMode::Time,
        }
    }
}

/// Append a request to the shared queue with a server-assigned timestamp
pub async fn insert_request(
    pool: &SqlitePool,
    kind: RequestKind,
    content: &str,
    title: Option<&str>,
    tip: i64,
) -> Result<SubmittedRequest> {
    let request = SubmittedRequest {
        id: Uuid::new_v4().to_string(),
        kind,
        content: content.to_string(),
        title: title.map(|t| t.to_string()),
        tip,
        status: RequestStatus::Pending,
        timestamp: Some(time::now_ms()),
    };

    sqlx::query(
        "INSERT INTO requests (id, kind, content, title, tip, status, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&request.id)
    .bind(request.kind)
    .bind(&request.content)
    .bind(&request.title)
    .bind(request.tip)
    .bind(request.status)
    .bind(request.timestamp)
    .execute(pool)
    .await?;

    info!(id = %request.id, tip = request.tip, "Request added to queue");
    Ok(request)
}

/// Fetch the full queue in store order (timestamp descending)
///
/// Includes archived rows; the live feed carries everything and consumers
/// filter. SQLite treats NULL as smallest, so rows without a timestamp land
/// at the end of a descending scan.
pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<SubmittedRequest>> {
    let requests = sqlx::query_as::<_, SubmittedRequest>(
        "SELECT id, kind, content, title, tip, status, timestamp
         FROM requests ORDER BY timestamp DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(requests)
}

/// Flip a request to archived. Returns false when the id is unknown.
///
/// Requests are never hard-deleted; archive is the only mutation.
pub async fn archive(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE requests SET status = 'archived' WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Produce the dashboard's view: archived rows removed, then sorted
///
/// Both sorts are stable, so ties keep the feed's own order.
pub fn dashboard_view(requests: &[SubmittedRequest], sort: SortMode) -> Vec<SubmittedRequest> {
    let mut view: Vec<SubmittedRequest> = requests
        .iter()
        .filter(|r| r.status != RequestStatus::Archived)
        .cloned()
        .collect();

    match sort {
        SortMode::Time => {
            view.sort_by_key(|r| std::cmp::Reverse(r.timestamp.unwrap_or(0)));
        }
        SortMode::Tip => {
            view.sort_by_key(|r| std::cmp::Reverse(r.tip));
        }
    }

    view
}
