//! reqline-server library - venue song-request service
//!
//! Attendee-facing submission and tip-payment endpoints, the DJ dashboard
//! API with an SSE live feed, the catalog search proxy chain, and booking
//! inquiries. The tip-payment claim protocol lives in `pending` + `confirm`.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use reqline_common::config::ServiceConfig;
use reqline_common::Result;

pub mod api;
pub mod confirm;
pub mod payment;
pub mod pending;
pub mod queue;
pub mod search;
pub mod sessions;
pub mod sse;

use payment::PaymentIntentClient;
use search::CatalogSearch;
use sessions::SessionStore;
use sse::QueueBroadcaster;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Live feed broadcaster for dashboard clients
    pub broadcaster: QueueBroadcaster,
    /// Active DJ session tokens
    pub sessions: SessionStore,
    /// Payment intent client; absent when no payment service is configured
    pub payment: Option<Arc<PaymentIntentClient>>,
    /// Catalog search fallback chain
    pub search: Arc<CatalogSearch>,
}

impl AppState {
    /// Create new application state from configuration
    pub fn new(db: SqlitePool, config: &ServiceConfig) -> Result<Self> {
        let payment = match &config.payment_intent_url {
            Some(url) => Some(Arc::new(PaymentIntentClient::new(url)?)),
            None => None,
        };

        Ok(Self {
            db,
            broadcaster: QueueBroadcaster::new(100),
            sessions: SessionStore::default(),
            payment,
            search: Arc::new(CatalogSearch::new(config.search_proxy_url.clone())?),
        })
    }
}

/// Build application router
///
/// Dashboard routes require a DJ session token; everything attendee-facing
/// is public. CORS is wide open - attendee pages are served from a separate
/// origin, as is the hosted payment flow that redirects back here.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require DJ authentication)
    let protected = Router::new()
        .route("/api/queue", get(api::list_requests))
        .route("/api/queue/:id/archive", post(api::archive_request))
        .route("/api/events", get(api::event_stream))
        .route("/api/auth/logout", post(api::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/requests", post(api::submit_request))
        .route("/api/tips/session", post(api::create_tip_session))
        .route("/payment/complete", get(api::payment_return))
        .route("/api/search", get(api::search_catalog))
        .route("/api/bookings", post(api::submit_booking))
        .route("/api/auth/login", post(api::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
