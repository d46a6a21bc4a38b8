use crate::domain_model::{AccountId, AccountSummary};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Why a session or refresh token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenRejection {
    #[error("token expired")]
    Expired,
    #[error("token revoked")]
    Revoked,
    #[error("token signature invalid")]
    BadSignature,
    #[error("token subject malformed")]
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnauthorizedReason {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing bearer token")]
    MissingBearer,
    #[error("unknown token")]
    UnknownToken,
    #[error("{0}")]
    Token(TokenRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account,
    RefreshToken,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Account => write!(f, "account"),
            Resource::RefreshToken => write!(f, "refresh token"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("unauthorized: {0}")]
    Unauthorized(UnauthorizedReason),
    #[error("{0}")]
    Validation(TokenRejection),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("password mismatch")]
    PasswordMismatch,
    #[error("account already exists")]
    AccountExists,
    #[error("refresh token collision")]
    TokenCollision,
    #[error("randomness source failed: {0}")]
    Randomness(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("store error: {0}")]
    Store(String),
}

impl AuthError {
    pub fn unauthorized_token(reason: TokenRejection) -> Self {
        AuthError::Unauthorized(UnauthorizedReason::Token(reason))
    }
}

#[derive(Clone, Serialize)]
pub struct SessionToken(pub String);

#[derive(Clone, Serialize)]
pub struct RefreshToken(pub String);

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(<redacted>)")
    }
}

#[derive(Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    /// Requested session lifetime; clamped by [`bounded_session_ttl`].
    pub expires_in: Option<Duration>,
}

#[derive(Clone)]
pub struct CreateAccountInput {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct UpdateAccountInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub account: AccountSummary,
    pub session_token: SessionToken,
    pub session_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
}

pub const MAX_SESSION_TTL_SECS: i64 = 60 * 60;

pub fn max_session_ttl() -> Duration {
    Duration::seconds(MAX_SESSION_TTL_SECS)
}

/// Unset, non-positive, or over-long lifetimes fall back to one hour.
pub fn bounded_session_ttl(requested: Option<Duration>) -> Duration {
    let max = max_session_ttl();
    match requested {
        Some(ttl) if ttl > Duration::zero() && ttl <= max => ttl,
        _ => max,
    }
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    /// Fails with [`AuthError::PasswordMismatch`] when the password does not match.
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<(), AuthError>;
}

pub trait SessionTokenCodec: Send + Sync {
    fn mint(
        &self,
        account_id: AccountId,
        ttl: Duration,
    ) -> Result<(SessionToken, DateTime<Utc>), AuthError>;
    fn verify(&self, token: &str) -> Result<AccountId, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialService: Send + Sync {
    async fn create_account(&self, input: CreateAccountInput)
    -> Result<AccountSummary, AuthError>;
    async fn update_account(
        &self,
        session_token: &str,
        input: UpdateAccountInput,
    ) -> Result<AccountSummary, AuthError>;
    async fn login(&self, input: LoginInput) -> Result<LoginResult, AuthError>;
    async fn authenticate(&self, session_token: &str) -> Result<AccountId, AuthError>;
    async fn renew(&self, refresh_token: &str) -> Result<SessionToken, AuthError>;
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_is_clamped_to_one_hour() {
        assert_eq!(bounded_session_ttl(None), Duration::seconds(3600));
        assert_eq!(bounded_session_ttl(Some(Duration::zero())), Duration::seconds(3600));
        assert_eq!(bounded_session_ttl(Some(Duration::seconds(-5))), Duration::seconds(3600));
        assert_eq!(bounded_session_ttl(Some(Duration::seconds(7200))), Duration::seconds(3600));
        assert_eq!(bounded_session_ttl(Some(Duration::seconds(60))), Duration::seconds(60));
        assert_eq!(bounded_session_ttl(Some(Duration::seconds(3600))), Duration::seconds(3600));
    }

    #[test]
    fn token_debug_output_is_redacted() {
        let session = SessionToken("header.payload.signature".to_string());
        let refresh = RefreshToken("deadbeef".to_string());
        assert!(!format!("{:?}", session).contains("payload"));
        assert!(!format!("{:?}", refresh).contains("deadbeef"));
    }
}
