use super::RefreshTokenIssuer;
use crate::application_port::*;
use crate::domain_model::{AccountId, AccountSummary, RefreshTokenRecord};
use crate::domain_port::AccountRepo;
use crate::logger::*;
use std::sync::Arc;

/// Attempts at writing a fresh refresh token before a collision is surfaced.
const REFRESH_ISSUE_ATTEMPTS: usize = 3;

pub struct RealCredentialService {
    account_repo: Arc<dyn AccountRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn SessionTokenCodec>,
    refresh_issuer: Arc<RefreshTokenIssuer>,
}

impl RealCredentialService {
    pub fn new(
        account_repo: Arc<dyn AccountRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn SessionTokenCodec>,
        refresh_issuer: Arc<RefreshTokenIssuer>,
    ) -> Self {
        Self {
            account_repo,
            credential_hasher,
            token_codec,
            refresh_issuer,
        }
    }

    fn validate_account_input(email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput("email is not valid".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password is empty".to_string()));
        }
        Ok(())
    }

    async fn issue_refresh_token(
        &self,
        account_id: AccountId,
    ) -> Result<RefreshTokenRecord, AuthError> {
        let mut attempt = 1;
        loop {
            match self.refresh_issuer.issue(account_id).await {
                Err(AuthError::TokenCollision) if attempt < REFRESH_ISSUE_ATTEMPTS => {
                    warn!(%account_id, attempt, "refresh token collision, regenerating");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

fn token_rejection_to_unauthorized(error: AuthError) -> AuthError {
    match error {
        AuthError::Validation(reason) => AuthError::unauthorized_token(reason),
        other => other,
    }
}

#[async_trait::async_trait]
impl CredentialService for RealCredentialService {
    async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<AccountSummary, AuthError> {
        let CreateAccountInput { email, password } = input;
        Self::validate_account_input(&email, &password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let account = self
            .account_repo
            .create(email.trim(), &password_hash)
            .await?;

        info!(account_id = %account.id, "account created");
        Ok(AccountSummary::from(&account))
    }

    async fn update_account(
        &self,
        session_token: &str,
        input: UpdateAccountInput,
    ) -> Result<AccountSummary, AuthError> {
        let account_id = self.authenticate(session_token).await?;

        let UpdateAccountInput { email, password } = input;
        Self::validate_account_input(&email, &password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let account = self
            .account_repo
            .update(account_id, email.trim(), &password_hash)
            .await?
            .ok_or(AuthError::NotFound(Resource::Account))?;

        info!(%account_id, "account updated");
        Ok(AccountSummary::from(&account))
    }

    async fn login(&self, input: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput {
            email,
            password,
            expires_in,
        } = input;

        let account = self
            .account_repo
            .get_by_email(email.trim())
            .await?
            .ok_or(AuthError::NotFound(Resource::Account))?;

        self.credential_hasher
            .verify_password(&password, &account.password_hash)
            .await
            .map_err(|e| match e {
                AuthError::PasswordMismatch => {
                    warn!(account_id = %account.id, "login rejected: wrong password");
                    AuthError::Unauthorized(UnauthorizedReason::InvalidCredentials)
                }
                other => other,
            })?;

        let (session_token, session_expires_at) = self
            .token_codec
            .mint(account.id, bounded_session_ttl(expires_in))?;

        let refresh = self.issue_refresh_token(account.id).await?;

        info!(account_id = %account.id, "login succeeded");
        Ok(LoginResult {
            account: AccountSummary::from(&account),
            session_token,
            session_expires_at,
            refresh_token: RefreshToken(refresh.token),
        })
    }

    async fn authenticate(&self, session_token: &str) -> Result<AccountId, AuthError> {
        self.token_codec
            .verify(session_token)
            .map_err(token_rejection_to_unauthorized)
    }

    async fn renew(&self, refresh_token: &str) -> Result<SessionToken, AuthError> {
        let record = self
            .refresh_issuer
            .lookup(refresh_token)
            .await
            .map_err(|e| match e {
                AuthError::NotFound(_) => AuthError::Unauthorized(UnauthorizedReason::UnknownToken),
                other => other,
            })?;

        if let Err(e) = RefreshTokenIssuer::validate_usable(&record) {
            warn!(account_id = %record.account_id, reason = %e, "renewal rejected");
            return Err(token_rejection_to_unauthorized(e));
        }

        // Renewal neither rotates nor extends the refresh token.
        let (session_token, _) = self
            .token_codec
            .mint(record.account_id, max_session_ttl())?;

        debug!(account_id = %record.account_id, "session renewed");
        Ok(session_token)
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_issuer.revoke(refresh_token).await?;
        info!("refresh token revoked");
        Ok(())
    }
}
