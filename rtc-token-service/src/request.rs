use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::expiry::{ExpiryPolicy, ExpiryWindow};
use crate::signer::{AppCredentials, SignerError, TokenSigner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Publisher,
    Subscriber,
}

impl Role {
    /// Wire names are exact: `publisher` and `audience`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "publisher" => Some(Role::Publisher),
            "audience" => Some(Role::Subscriber),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Publisher => "publisher",
            Role::Subscriber => "audience",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    NamedAccount,
    NumericUid,
}

impl SubjectKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "userAccount" => Some(SubjectKind::NamedAccount),
            "uid" => Some(SubjectKind::NumericUid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::NamedAccount => "userAccount",
            SubjectKind::NumericUid => "uid",
        }
    }
}

/// Untrusted request parameters exactly as received.
#[derive(Debug, Clone, Default)]
pub struct RawTokenRequest {
    pub channel: Option<String>,
    pub role: Option<String>,
    pub token_type: Option<String>,
    pub uid: Option<String>,
    pub expiry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub channel: String,
    pub subject: String,
    pub role: Role,
    pub subject_kind: SubjectKind,
    pub requested_lifetime: Option<String>,
}

impl TryFrom<RawTokenRequest> for CredentialRequest {
    type Error = TokenRequestError;

    fn try_from(raw: RawTokenRequest) -> Result<Self, Self::Error> {
        let channel = non_empty(raw.channel).ok_or(TokenRequestError::MissingField("channel"))?;
        let subject = non_empty(raw.uid).ok_or(TokenRequestError::MissingField("uid"))?;
        let role = raw
            .role
            .as_deref()
            .and_then(Role::parse)
            .ok_or(TokenRequestError::InvalidRole)?;
        let subject_kind = raw
            .token_type
            .as_deref()
            .and_then(SubjectKind::parse)
            .ok_or(TokenRequestError::InvalidTokenType)?;

        Ok(Self {
            channel,
            subject,
            role,
            subject_kind,
            requested_lifetime: raw.expiry,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingField,
    InvalidValue,
    SigningError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MissingField => "missing_field",
            FailureKind::InvalidValue => "invalid_value",
            FailureKind::SigningError => "signing_error",
        }
    }
}

/// Display output is the exact message returned to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenRequestError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("role is incorrect")]
    InvalidRole,
    #[error("token type is invalid")]
    InvalidTokenType,
    #[error(transparent)]
    Signing(#[from] SignerError),
}

impl TokenRequestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TokenRequestError::MissingField(_) => FailureKind::MissingField,
            TokenRequestError::InvalidRole | TokenRequestError::InvalidTokenType => {
                FailureKind::InvalidValue
            }
            TokenRequestError::Signing(_) => FailureKind::SigningError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub channel: String,
    pub role: Role,
    pub subject_kind: SubjectKind,
    pub window: ExpiryWindow,
}

pub type RequestOutcome = Result<IssuedToken, TokenRequestError>;

/// Validates credential requests and dispatches them to the signer.
#[derive(Clone)]
pub struct TokenRequestHandler {
    credentials: Arc<AppCredentials>,
    policy: ExpiryPolicy,
    signer: Arc<dyn TokenSigner>,
}

impl TokenRequestHandler {
    pub fn new(
        credentials: Arc<AppCredentials>,
        policy: ExpiryPolicy,
        signer: Arc<dyn TokenSigner>,
    ) -> Self {
        Self {
            credentials,
            policy,
            signer,
        }
    }

    pub fn handle(&self, raw: RawTokenRequest) -> RequestOutcome {
        self.handle_at(raw, Utc::now().timestamp())
    }

    pub fn handle_at(&self, raw: RawTokenRequest, now: i64) -> RequestOutcome {
        let request = CredentialRequest::try_from(raw)?;
        let window = self
            .policy
            .compute(request.requested_lifetime.as_deref(), now);

        let token = match request.subject_kind {
            SubjectKind::NamedAccount => self.signer.sign_with_account(
                &self.credentials,
                &request.channel,
                &request.subject,
                request.role,
                window.absolute_expiry,
            )?,
            SubjectKind::NumericUid => self.signer.sign_with_uid(
                &self.credentials,
                &request.channel,
                &request.subject,
                request.role,
                window.absolute_expiry,
            )?,
        };

        Ok(IssuedToken {
            token,
            channel: request.channel,
            role: request.role,
            subject_kind: request.subject_kind,
            window,
        })
    }
}
