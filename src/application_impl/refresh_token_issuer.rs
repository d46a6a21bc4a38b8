use crate::application_port::{AuthError, Resource, TokenRejection};
use crate::domain_model::{AccountId, RefreshTokenRecord};
use crate::domain_port::RefreshTokenRepo;
use crate::logger::*;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// 256 bits of entropy, hex encoded to 64 characters.
pub const REFRESH_TOKEN_BYTES: usize = 32;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// Generates opaque refresh tokens and tracks their issued/revoked lifecycle.
pub struct RefreshTokenIssuer {
    repo: Arc<dyn RefreshTokenRepo>,
    ttl: Duration,
}

impl RefreshTokenIssuer {
    pub fn new(repo: Arc<dyn RefreshTokenRepo>) -> Self {
        RefreshTokenIssuer {
            repo,
            ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS),
        }
    }

    pub fn generate() -> Result<String, AuthError> {
        let mut buf = [0u8; REFRESH_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| AuthError::Randomness(e.to_string()))?;
        Ok(hex::encode(buf))
    }

    pub async fn issue(&self, account_id: AccountId) -> Result<RefreshTokenRecord, AuthError> {
        let token = Self::generate()?;
        let expires_at = Utc::now() + self.ttl;
        let record = self.repo.insert(&token, account_id, expires_at).await?;
        debug!(%account_id, %expires_at, "refresh token issued");
        Ok(record)
    }

    pub async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, AuthError> {
        self.repo
            .find_by_token(token)
            .await?
            .ok_or(AuthError::NotFound(Resource::RefreshToken))
    }

    pub fn validate_usable(record: &RefreshTokenRecord) -> Result<(), AuthError> {
        Self::validate_usable_at(record, Utc::now())
    }

    pub fn validate_usable_at(
        record: &RefreshTokenRecord,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        if now >= record.expires_at {
            return Err(AuthError::Validation(TokenRejection::Expired));
        }
        if record.is_revoked() {
            return Err(AuthError::Validation(TokenRejection::Revoked));
        }
        Ok(())
    }

    /// Revoking an already revoked token succeeds and keeps the first revocation time.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let record = self.lookup(token).await?;
        let now = Utc::now();
        self.repo.set_revoked(&record.token, now, now).await?;
        debug!(account_id = %record.account_id, "refresh token revoked");
        Ok(())
    }
}
