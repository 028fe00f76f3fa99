use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    response::Response,
    Json,
};
use common_http_errors::ApiError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::StatusPolicy;
use crate::metrics::RtcMetrics;
use crate::request::{FailureKind, RawTokenRequest, TokenRequestError};
use crate::AppState;

pub const GREETING: &str = "استشرني!";

const INVALID_PATH: &str = "invalid_path";

#[derive(Debug, Deserialize)]
pub struct RtcTokenPath {
    pub channel: String,
    pub role: String,
    pub tokentype: String,
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct RtcTokenResponse {
    #[serde(rename = "rtcToken")]
    pub rtc_token: String,
}

pub async fn root() -> &'static str {
    GREETING
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn metrics_endpoint(
    State(metrics): State<Arc<RtcMetrics>>,
) -> Result<Response, ApiError> {
    metrics
        .render()
        .map_err(|err| ApiError::internal("metrics_render", err))
}

pub async fn generate_rtc_token(
    State(state): State<AppState>,
    path: Result<Path<RtcTokenPath>, PathRejection>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<RtcTokenResponse>, ApiError> {
    let Path(path) = path.map_err(|rejection| {
        debug!(error = %rejection, "Rejected RTC token path");
        state.metrics.token_request(INVALID_PATH);
        ApiError::bad_request(INVALID_PATH, rejection.body_text())
    })?;
    let raw = RawTokenRequest {
        channel: Some(path.channel),
        role: Some(path.role),
        token_type: Some(path.tokentype),
        uid: Some(path.uid),
        expiry: first_expiry(query),
    };

    match state.issuer.handle(raw) {
        Ok(issued) => {
            info!(
                channel = %issued.channel,
                role = issued.role.as_str(),
                token_type = issued.subject_kind.as_str(),
                issued_at = issued.window.issued_at,
                expires_at = issued.window.absolute_expiry,
                "Issued RTC token"
            );
            state
                .metrics
                .token_issued(issued.role.as_str(), issued.window.lifetime_seconds);
            Ok(Json(RtcTokenResponse {
                rtc_token: issued.token,
            }))
        }
        Err(err) => {
            let kind = err.kind();
            match kind {
                FailureKind::SigningError => warn!(error = %err, "RTC token signing failed"),
                _ => debug!(error = %err, code = kind.as_str(), "Rejected RTC token request"),
            }
            state.metrics.token_request(kind.as_str());
            Err(to_api_error(&err, state.config.status_policy))
        }
    }
}

/// Repeated `expiry` keys are allowed; the first one wins.
fn first_expiry(query: Vec<(String, String)>) -> Option<String> {
    query
        .into_iter()
        .find(|(key, _)| key == "expiry")
        .map(|(_, value)| value)
}

pub fn to_api_error(err: &TokenRequestError, policy: StatusPolicy) -> ApiError {
    let kind = err.kind();
    match (policy, kind) {
        (StatusPolicy::Strict, FailureKind::MissingField | FailureKind::InvalidValue) => {
            ApiError::bad_request(kind.as_str(), err.to_string())
        }
        _ => ApiError::internal(kind.as_str(), err),
    }
}
