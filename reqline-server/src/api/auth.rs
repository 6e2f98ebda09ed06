//! DJ authentication: login, logout, and the dashboard gate
//!
//! Email/password checked against the settings table, exchanged for a
//! bearer token held in the in-memory session store. The attendee surface
//! never needs an account; only dashboard routes sit behind the middleware.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};

use reqline_common::db::{get_setting, set_setting};
use reqline_common::Result;

use crate::AppState;

pub const SETTING_DJ_EMAIL: &str = "dj_email";
pub const SETTING_DJ_PASSWORD_HASH: &str = "dj_password_hash";

/// SHA-256 hex digest of a password
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Store the DJ credential unless one is already configured
///
/// Called at startup when the environment provides a credential; an
/// existing credential in the database wins.
pub async fn ensure_dj_credential(pool: &SqlitePool, email: &str, password: &str) -> Result<()> {
    if get_setting(pool, SETTING_DJ_EMAIL).await?.is_some() {
        return Ok(());
    }
    set_setting(pool, SETTING_DJ_EMAIL, email).await?;
    set_setting(pool, SETTING_DJ_PASSWORD_HASH, &hash_password(password)).await?;
    info!("Seeded DJ credential for {}", email);
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> std::result::Result<Json<LoginResponse>, AuthError> {
    let email = get_setting(&state.db, SETTING_DJ_EMAIL)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    let password_hash = get_setting(&state.db, SETTING_DJ_PASSWORD_HASH)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let (Some(email), Some(password_hash)) = (email, password_hash) else {
        return Err(AuthError::NotConfigured);
    };

    if body.email != email || hash_password(&body.password) != password_hash {
        warn!("Rejected DJ login for {}", body.email);
        return Err(AuthError::InvalidCredentials);
    }

    let token = state.sessions.issue();
    info!("DJ signed in");
    Ok(Json(LoginResponse { token }))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, request: Request) -> StatusCode {
    if let Some(token) = bearer_token(&request) {
        state.sessions.revoke(token);
        info!("DJ signed out");
    }
    StatusCode::NO_CONTENT
}

/// Authentication middleware for dashboard routes
///
/// Requires `Authorization: Bearer <token>` naming an active session.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, AuthError> {
    let token = bearer_token(&request).ok_or(AuthError::MissingToken)?;

    if !state.sessions.is_valid(token) {
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    InvalidCredentials,
    NotConfigured,
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Missing bearer token".to_string())
            }
            AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired session".to_string())
            }
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
            }
            AuthError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DJ credential not configured".to_string(),
            ),
            AuthError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Authentication error: {}", msg),
            ),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
