use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::FromRef,
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::RtcConfig;
use crate::handlers::{generate_rtc_token, health, metrics_endpoint, root};
use crate::metrics::RtcMetrics;
use crate::request::TokenRequestHandler;
use crate::signer::TokenSigner;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RtcConfig>,
    pub issuer: TokenRequestHandler,
    pub metrics: Arc<RtcMetrics>,
}

impl AppState {
    pub fn new(config: RtcConfig, signer: Arc<dyn TokenSigner>) -> Result<Self> {
        let issuer = TokenRequestHandler::new(
            Arc::new(config.credentials.clone()),
            config.expiry_policy(),
            signer,
        );
        Ok(Self {
            config: Arc::new(config),
            issuer,
            metrics: Arc::new(RtcMetrics::new()?),
        })
    }
}

impl FromRef<AppState> for Arc<RtcMetrics> {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// Token responses are never cached and are readable from any origin.
fn rtc_routes() -> Router<AppState> {
    Router::new()
        .route("/rtc/:channel/:role/:tokentype/:uid", get(generate_rtc_token))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("private, no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("-1"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .merge(rtc_routes())
        .with_state(state)
}
