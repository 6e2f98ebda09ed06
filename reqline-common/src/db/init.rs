//! Database initialization
//!
//! Schema creation is idempotent (`CREATE TABLE IF NOT EXISTS`), so every
//! component can call `init_database` at startup in any order.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc creates the database file on first run
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer; the request queue takes
    // concurrent inserts from many attendees
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all ReqLine tables (idempotent - safe to call multiple times)
///
/// Exposed separately so tests can build an in-memory database.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Shared request queue, observed live by the DJ dashboard
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS requests (
            id          TEXT PRIMARY KEY,
            kind        TEXT NOT NULL CHECK (kind IN ('link', 'search')),
            content     TEXT NOT NULL,
            title       TEXT,
            tip         INTEGER NOT NULL DEFAULT 0 CHECK (tip >= 0),
            status      TEXT NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'archived')),
            timestamp   INTEGER
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_requests_timestamp
         ON requests (timestamp DESC)",
    )
    .execute(pool)
    .await?;

    // Pending tip requests awaiting payment confirmation; rows are removed by
    // the atomic claim and never updated in place
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS pending_requests (
            request_id  TEXT PRIMARY KEY,
            kind        TEXT NOT NULL CHECK (kind IN ('link', 'search')),
            content     TEXT NOT NULL,
            title       TEXT,
            tip         INTEGER NOT NULL CHECK (tip > 0),
            created_at  INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Booking inquiries from the public site
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bookings (
            id                  TEXT PRIMARY KEY,
            name                TEXT NOT NULL,
            phone               TEXT NOT NULL,
            contact_preference  TEXT,
            date                TEXT,
            start_time          TEXT,
            end_time            TEXT,
            time_range          TEXT,
            event_type          TEXT,
            status              TEXT NOT NULL DEFAULT 'new',
            timestamp           INTEGER
        )",
    )
    .execute(pool)
    .await?;

    // Key/value settings (DJ credential lives here)
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS settings (
            key     TEXT PRIMARY KEY,
            value   TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Read a setting value, if present
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v))
}

/// Insert or replace a setting
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    Ok(())
}
