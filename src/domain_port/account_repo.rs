use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait AccountRepo: Send + Sync {
    /// Insert a new account. A taken email fails with [`AuthError::AccountExists`].
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, AuthError>;

    /// Replace email and password hash. `None` when no such account exists.
    async fn update(
        &self,
        id: AccountId,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, AuthError>;

    /// Fetch an account by email (for login).
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthError>;
}
