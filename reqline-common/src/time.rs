//! Timestamp utilities

use chrono::{DateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as milliseconds since the UNIX epoch
///
/// Wire timestamps (request queue, bookings, SSE events) all use epoch ms.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert an epoch-ms timestamp back to a UTC datetime
///
/// Out-of-range values fall back to the epoch itself, matching the
/// dashboard's "absent timestamps sort as epoch zero" rule.
pub fn from_ms(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
}
