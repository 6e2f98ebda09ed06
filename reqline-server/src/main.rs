//! reqline-server - venue song-request service
//!
//! Attendee submissions and tip payments, the DJ dashboard with a live SSE
//! feed, catalog search, and booking inquiries, all over one SQLite store.

use anyhow::Result;
use tracing::info;

use reqline_common::config::{self, ServiceConfig};
use reqline_common::db::init_database;
use reqline_server::{api, build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting ReqLine server v{}", env!("CARGO_PKG_VERSION"));

    let service_config = ServiceConfig::from_env();

    let root_folder = config::resolve_root_folder()?;
    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;

    // First-run credential seed from the environment; an existing
    // credential in the database wins
    if let (Some(email), Some(password)) =
        (&service_config.dj_email, &service_config.dj_password)
    {
        api::auth::ensure_dj_credential(&pool, email, password).await?;
    }

    if service_config.payment_intent_url.is_none() {
        info!("No payment intent service configured; tip sessions disabled");
    }

    let state = AppState::new(pool, &service_config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&service_config.bind_addr).await?;
    info!("reqline-server listening on http://{}", service_config.bind_addr);
    info!("Health check: http://{}/health", service_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
