use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use tenant_cms::config::config;
use tenant_cms::database::{DatabaseManager, PgStore};
use tenant_cms::server::{app, AppState};
use tenant_cms::services::ContentService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config();
    tracing::info!(
        "Starting tenant CMS in {:?} mode, rollout phase {:?}",
        config.environment,
        config.tenancy.rollout_phase
    );
    if config.security.auth_secret.is_none() {
        tracing::warn!("AUTH_SECRET is not set; every bearer token will be rejected");
    }

    let pool = DatabaseManager::main_pool().await.context("connecting to database")?;
    let service = ContentService::new(Arc::new(PgStore::new(pool)), config.tenancy.rollout_phase);
    let state = AppState::new(service, config.security.auth_secret.clone());

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Tenant CMS listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server error")?;

    DatabaseManager::close_all().await;
    Ok(())
}
