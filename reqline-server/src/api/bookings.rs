//! Booking inquiries from the public site

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use reqline_common::time;

use crate::AppState;

/// Body for POST /api/bookings
#[derive(Debug, Deserialize)]
pub struct BookingBody {
    pub name: String,
    pub phone: String,
    pub contact_preference: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_range: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: String,
}

/// POST /api/bookings
pub async fn submit_booking(
    State(state): State<AppState>,
    Json(body): Json<BookingBody>,
) -> Result<(StatusCode, Json<BookingResponse>), BookingError> {
    if body.name.trim().is_empty() || body.phone.trim().is_empty() {
        return Err(BookingError::MissingFields);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO bookings
         (id, name, phone, contact_preference, date, start_time, end_time,
          time_range, event_type, status, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'new', ?)",
    )
    .bind(&id)
    .bind(body.name.trim())
    .bind(body.phone.trim())
    .bind(&body.contact_preference)
    .bind(&body.date)
    .bind(&body.start_time)
    .bind(&body.end_time)
    .bind(&body.time_range)
    .bind(&body.event_type)
    .bind(time::now_ms())
    .execute(&state.db)
    .await
    .map_err(|e| BookingError::Internal(e.to_string()))?;

    info!(id = %id, "Booking inquiry received");
    Ok((StatusCode::CREATED, Json(BookingResponse { id })))
}

/// Booking error types
#[derive(Debug)]
pub enum BookingError {
    MissingFields,
    Internal(String),
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            BookingError::MissingFields => (
                StatusCode::BAD_REQUEST,
                "Name and phone are required".to_string(),
            ),
            BookingError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
