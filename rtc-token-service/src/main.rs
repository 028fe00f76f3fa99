use std::sync::Arc;

use anyhow::Context;
use rtc_token_service::config::load_rtc_config;
use rtc_token_service::signer::{validate_credentials, AccessTokenSigner};
use rtc_token_service::{build_router, AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_rtc_config().context("Failed to load rtc-token-service configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = validate_credentials(&config.credentials) {
        warn!(error = %err, "Configured app credentials will be rejected by the signer");
    }

    let addr = config.bind_addr();
    info!(
        app_id = %config.credentials.app_id,
        status_policy = ?config.status_policy,
        max_token_lifetime_seconds = ?config.max_token_lifetime_seconds,
        "Configuration loaded"
    );

    let state = AppState::new(config, Arc::new(AccessTokenSigner::new()))?;
    let app = build_router(state);

    info!(%addr, "starting rtc-token-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
