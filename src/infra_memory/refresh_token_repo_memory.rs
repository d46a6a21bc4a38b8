use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Default)]
pub struct MemoryRefreshTokenRepo {
    tokens: DashMap<String, RefreshTokenRecord>,
}

impl MemoryRefreshTokenRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MemoryRefreshTokenRepo {
    async fn insert(
        &self,
        token: &str,
        account_id: AccountId,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, AuthError> {
        match self.tokens.entry(token.to_string()) {
            Entry::Occupied(_) => Err(AuthError::TokenCollision),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let record = RefreshTokenRecord {
                    token: token.to_string(),
                    account_id,
                    created_at: now,
                    updated_at: now,
                    expires_at,
                    revoked_at: None,
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        Ok(self.tokens.get(token).map(|r| r.value().clone()))
    }

    async fn set_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        if let Some(mut record) = self.tokens.get_mut(token) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(revoked_at);
            }
            record.updated_at = updated_at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn duplicate_token_is_a_collision() {
        let repo = MemoryRefreshTokenRepo::new();
        let owner = AccountId::new_random();
        let expires_at = Utc::now() + Duration::days(1);

        repo.insert("abc", owner, expires_at).await.unwrap();
        let err = repo.insert("abc", owner, expires_at).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenCollision));
    }

    #[tokio::test]
    async fn first_revocation_time_is_kept() {
        let repo = MemoryRefreshTokenRepo::new();
        let owner = AccountId::new_random();
        repo.insert("abc", owner, Utc::now() + Duration::days(1))
            .await
            .unwrap();

        let first = Utc::now();
        repo.set_revoked("abc", first, first).await.unwrap();
        let later = first + Duration::seconds(30);
        repo.set_revoked("abc", later, later).await.unwrap();

        let record = repo.find_by_token("abc").await.unwrap().unwrap();
        assert_eq!(record.revoked_at, Some(first));
        assert_eq!(record.updated_at, later);
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let repo = MemoryRefreshTokenRepo::new();
        repo.insert("abcdef", AccountId::new_random(), Utc::now() + Duration::days(1))
            .await
            .unwrap();

        assert!(repo.find_by_token("ABCDEF").await.unwrap().is_none());
        assert!(repo.find_by_token("abcdef").await.unwrap().is_some());
    }
}
