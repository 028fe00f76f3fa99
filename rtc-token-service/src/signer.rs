use std::fmt;

use chrono::Utc;
use thiserror::Error;

use crate::access_token::{AccessToken, Privilege};
use crate::request::Role;

const APP_KEY_LEN: usize = 32;
const MAX_CHANNEL_NAME_BYTES: usize = 64;
const MAX_ACCOUNT_BYTES: usize = 255;
const CHANNEL_PUNCTUATION: &str = " !#$%&()+-:;<=.>?@[]^_{}|~,";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("invalid app id: expected 32 hexadecimal characters")]
    InvalidAppId,
    #[error("invalid app certificate: expected 32 hexadecimal characters")]
    InvalidAppCertificate,
    #[error("invalid channel name: {0}")]
    InvalidChannelName(&'static str),
    #[error("invalid user account: must be at most 255 bytes")]
    InvalidAccount,
    #[error("invalid uid '{0}': expected an unsigned 32-bit integer")]
    InvalidUid(String),
    #[error("privilege expiry {0} is outside the supported timestamp range")]
    ExpiryOutOfRange(i64),
}

/// Process-wide application identity used to sign every token.
#[derive(Clone)]
pub struct AppCredentials {
    pub app_id: String,
    app_certificate: String,
}

impl AppCredentials {
    pub fn new(app_id: impl Into<String>, app_certificate: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_certificate: app_certificate.into(),
        }
    }

    pub fn app_certificate(&self) -> &str {
        &self.app_certificate
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("app_certificate", &"[REDACTED]")
            .finish()
    }
}

/// Signing primitive with one entry point per subject representation.
pub trait TokenSigner: Send + Sync {
    fn sign_with_account(
        &self,
        credentials: &AppCredentials,
        channel: &str,
        account: &str,
        role: Role,
        expires_at: i64,
    ) -> Result<String, SignerError>;

    fn sign_with_uid(
        &self,
        credentials: &AppCredentials,
        channel: &str,
        uid: &str,
        role: Role,
        expires_at: i64,
    ) -> Result<String, SignerError>;
}

/// Builds version `006` access tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessTokenSigner;

impl AccessTokenSigner {
    pub fn new() -> Self {
        Self
    }

    fn finish(token: &mut AccessToken, role: Role, expires_at: u32) -> String {
        token.add_privilege(Privilege::JoinChannel, expires_at);
        if role == Role::Publisher {
            token.add_privilege(Privilege::PublishAudioStream, expires_at);
            token.add_privilege(Privilege::PublishVideoStream, expires_at);
            token.add_privilege(Privilege::PublishDataStream, expires_at);
        }
        token.build()
    }
}

impl TokenSigner for AccessTokenSigner {
    fn sign_with_account(
        &self,
        credentials: &AppCredentials,
        channel: &str,
        account: &str,
        role: Role,
        expires_at: i64,
    ) -> Result<String, SignerError> {
        validate_credentials(credentials)?;
        validate_channel_name(channel)?;
        if account.len() > MAX_ACCOUNT_BYTES {
            return Err(SignerError::InvalidAccount);
        }
        let expires_at = privilege_timestamp(expires_at)?;

        let mut token = AccessToken::new(
            &credentials.app_id,
            credentials.app_certificate(),
            channel,
            account,
            issued_at(),
        );
        Ok(Self::finish(&mut token, role, expires_at))
    }

    fn sign_with_uid(
        &self,
        credentials: &AppCredentials,
        channel: &str,
        uid: &str,
        role: Role,
        expires_at: i64,
    ) -> Result<String, SignerError> {
        validate_credentials(credentials)?;
        validate_channel_name(channel)?;
        let numeric_uid = uid
            .parse::<u32>()
            .map_err(|_| SignerError::InvalidUid(uid.to_string()))?;
        let expires_at = privilege_timestamp(expires_at)?;

        let mut token = AccessToken::with_uid(
            &credentials.app_id,
            credentials.app_certificate(),
            channel,
            numeric_uid,
            issued_at(),
        );
        Ok(Self::finish(&mut token, role, expires_at))
    }
}

fn issued_at() -> u32 {
    u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX)
}

fn privilege_timestamp(expires_at: i64) -> Result<u32, SignerError> {
    u32::try_from(expires_at).map_err(|_| SignerError::ExpiryOutOfRange(expires_at))
}

fn is_app_key(value: &str) -> bool {
    value.len() == APP_KEY_LEN && value.bytes().all(|byte| byte.is_ascii_hexdigit())
}

pub fn validate_credentials(credentials: &AppCredentials) -> Result<(), SignerError> {
    if !is_app_key(&credentials.app_id) {
        return Err(SignerError::InvalidAppId);
    }
    if !is_app_key(credentials.app_certificate()) {
        return Err(SignerError::InvalidAppCertificate);
    }
    Ok(())
}

fn validate_channel_name(channel: &str) -> Result<(), SignerError> {
    if channel.is_empty() {
        return Err(SignerError::InvalidChannelName("must not be empty"));
    }
    if channel.len() > MAX_CHANNEL_NAME_BYTES {
        return Err(SignerError::InvalidChannelName("must be at most 64 bytes"));
    }
    let allowed = channel
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || CHANNEL_PUNCTUATION.contains(c));
    if !allowed {
        return Err(SignerError::InvalidChannelName(
            "contains unsupported characters",
        ));
    }
    Ok(())
}
