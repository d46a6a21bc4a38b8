use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    /// Insert a row. The token value is unique; a duplicate fails with
    /// [`AuthError::TokenCollision`].
    async fn insert(
        &self,
        token: &str,
        account_id: AccountId,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, AuthError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Mark the row revoked. An already revoked row keeps its first `revoked_at`.
    async fn set_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;
}
