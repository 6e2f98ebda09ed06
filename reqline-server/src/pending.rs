//! Pending-Claim Store
//!
//! Holds tip requests between form submission and payment confirmation.
//! `put` is an idempotent upsert keyed by request id; `claim` is a single
//! `DELETE ... RETURNING` statement, so the read-then-delete is atomic per
//! key and exactly one concurrent claimer can observe a given record. That
//! claim is the only synchronization primitive the payment protocol uses.
//!
//! The store enforces no expiry: records abandoned mid-checkout accumulate
//! until claimed. Accepted bounded leak.

use reqline_common::db::models::PendingTipRequest;
use reqline_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// Diagnostic key format, carried over from the original per-tab store
pub fn storage_key(request_id: &str) -> String {
    format!("pending_request_{}", request_id)
}

/// Store a pending tip request, silently overwriting any record with the
/// same id. Correct callers only repeat an id when retrying a failed
/// session initiation, where the replacement is byte-identical.
pub async fn put(pool: &SqlitePool, record: &PendingTipRequest) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO pending_requests
         (request_id, kind, content, title, tip, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.request_id)
    .bind(record.kind)
    .bind(&record.content)
    .bind(&record.title)
    .bind(record.tip)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    debug!(key = %storage_key(&record.request_id), tip = record.tip, "Stored pending request");
    Ok(())
}

/// Atomically claim (read-and-delete) a pending request
///
/// Returns the record to exactly one caller; every later claim for the same
/// id returns `None`. The claim is irreversible.
pub async fn claim(pool: &SqlitePool, request_id: &str) -> Result<Option<PendingTipRequest>> {
    let record = sqlx::query_as::<_, PendingTipRequest>(
        "DELETE FROM pending_requests WHERE request_id = ?
         RETURNING request_id, kind, content, title, tip, created_at",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    debug!(
        key = %storage_key(request_id),
        claimed = record.is_some(),
        "Claim attempt on pending store"
    );
    Ok(record)
}

/// Check for a pending record without consuming it (diagnostics and tests)
pub async fn peek(pool: &SqlitePool, request_id: &str) -> Result<Option<PendingTipRequest>> {
    let record = sqlx::query_as::<_, PendingTipRequest>(
        "SELECT request_id, kind, content, title, tip, created_at
         FROM pending_requests WHERE request_id = ?",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqline_common::db::create_schema;
    use reqline_common::db::models::RequestKind;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        // Single connection: every pooled connection to sqlite::memory:
        // would otherwise get its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    fn sample(request_id: &str, tip: i64) -> PendingTipRequest {
        PendingTipRequest {
            request_id: request_id.to_string(),
            kind: RequestKind::Link,
            content: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            title: Some("Never Gonna Give You Up".to_string()),
            tip,
            created_at: 1_730_000_000_000,
        }
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(storage_key("abc-123"), "pending_request_abc-123");
    }

    #[tokio::test]
    async fn test_claim_returns_record_once_then_absent() {
        let pool = memory_pool().await;
        put(&pool, &sample("req-1", 10)).await.unwrap();

        let first = claim(&pool, "req-1").await.unwrap();
        assert_eq!(first.unwrap().tip, 10);

        let second = claim(&pool, "req-1").await.unwrap();
        assert!(second.is_none(), "second claim must return absent");
    }

    #[tokio::test]
    async fn test_claim_unknown_id_returns_absent() {
        let pool = memory_pool().await;
        assert!(claim(&pool, "never-stored").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_idempotent_per_id() {
        let pool = memory_pool().await;
        put(&pool, &sample("req-2", 5)).await.unwrap();
        // Retry after a failed session initiation repeats the put
        put(&pool, &sample("req-2", 5)).await.unwrap();

        let claimed = claim(&pool, "req-2").await.unwrap().unwrap();
        assert_eq!(claimed.tip, 5);
        assert!(claim(&pool, "req-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_claims_exactly_one_winner() {
        // File-backed database with a real connection pool, so claimers run
        // on independent connections like independent browser tabs
        let dir = tempfile::TempDir::new().unwrap();
        let pool = reqline_common::db::init_database(&dir.path().join("claims.db"))
            .await
            .unwrap();

        put(&pool, &sample("raced", 20)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(
                async move { claim(&pool, "raced").await.unwrap() },
            ));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1, "exactly one concurrent claim may win");
    }
}
