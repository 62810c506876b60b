mod admin;
mod backend;
mod config;
mod errors;
mod form;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::admin::session::AdminSessions;
use crate::backend::BackendClient;
use crate::config::Config;
use crate::form::registry::FormRegistry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Careers API v{}", env!("CARGO_PKG_VERSION"));

    // One client serves both submissions and lookup lists
    let backend = Arc::new(
        BackendClient::new(
            config.backend_url.clone(),
            config.backend_admin_token.clone(),
            Duration::from_secs(config.backend_timeout_secs),
        )
        .context("Failed to build backend HTTP client")?,
    );
    info!("Backend client initialized ({})", config.backend_url);

    let session_ttl = chrono::Duration::try_minutes(config.admin_session_ttl_minutes)
        .context("ADMIN_SESSION_TTL_MINUTES is out of range")?;
    let admin = AdminSessions::new(config.admin_password.clone(), session_ttl);

    let idle_ttl = u64::try_from(config.form_idle_ttl_minutes)
        .ok()
        .and_then(|minutes| minutes.checked_mul(60))
        .map(Duration::from_secs)
        .context("FORM_IDLE_TTL_MINUTES is out of range")?;

    let state = AppState {
        config: config.clone(),
        forms: FormRegistry::new(idle_ttl),
        admin,
        submitter: backend.clone(),
        lookups: backend,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
