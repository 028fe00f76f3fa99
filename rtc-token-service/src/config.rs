use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};

use crate::expiry::ExpiryPolicy;
use crate::signer::AppCredentials;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// How failed token requests map onto HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Every failure is a 500.
    #[default]
    Uniform,
    /// Missing or invalid parameters are a 400; signer failures stay 500.
    Strict,
}

#[derive(Debug, Clone)]
pub struct RtcConfig {
    pub credentials: AppCredentials,
    pub host: IpAddr,
    pub port: u16,
    pub max_token_lifetime_seconds: Option<u64>,
    pub status_policy: StatusPolicy,
}

impl RtcConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_id = lookup("APP_ID")
            .and_then(|value| normalize_optional(&value))
            .context("APP_ID must be set")?;
        let app_certificate = lookup("APP_CERTIFICATE")
            .and_then(|value| normalize_optional(&value))
            .context("APP_CERTIFICATE must be set")?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host
            .trim()
            .parse()
            .map_err(|err| anyhow!("Invalid HOST '{host}': {err}"))?;

        let port = match lookup("PORT").and_then(|value| normalize_optional(&value)) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|err| anyhow!("Invalid PORT '{value}': {err}"))?,
            None => DEFAULT_PORT,
        };

        let max_token_lifetime_seconds = lookup("RTC_MAX_TOKEN_LIFETIME_SECONDS")
            .and_then(|value| normalize_optional(&value))
            .map(|value| {
                value.parse::<u64>().map_err(|err| {
                    anyhow!("Invalid RTC_MAX_TOKEN_LIFETIME_SECONDS '{value}': {err}")
                })
            })
            .transpose()?;

        let status_policy = if lookup("RTC_STRICT_STATUS_CODES")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
        {
            StatusPolicy::Strict
        } else {
            StatusPolicy::Uniform
        };

        Ok(Self {
            credentials: AppCredentials::new(app_id, app_certificate),
            host,
            port,
            max_token_lifetime_seconds,
            status_policy,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(self.max_token_lifetime_seconds)
    }
}

/// Reads `.env` when present, then the process environment.
pub fn load_rtc_config() -> Result<RtcConfig> {
    dotenvy::dotenv().ok();
    RtcConfig::from_lookup(|key| env::var(key).ok())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
