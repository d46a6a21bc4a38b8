use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Process-local account store. Email uniqueness is kept by a secondary index.
#[derive(Default)]
pub struct MemoryAccountRepo {
    accounts: DashMap<AccountId, Account>,
    emails: DashMap<String, AccountId>,
}

impl MemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AccountRepo for MemoryAccountRepo {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, AuthError> {
        let id = AccountId::new_random();
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => return Err(AuthError::AccountExists),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let now = Utc::now();
        let account = Account {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn update(
        &self,
        id: AccountId,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, AuthError> {
        let Some(previous_email) = self.accounts.get(&id).map(|a| a.email.clone()) else {
            return Ok(None);
        };

        if previous_email != email {
            match self.emails.entry(email.to_string()) {
                Entry::Occupied(owner) if *owner.get() != id => {
                    return Err(AuthError::AccountExists);
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove(&previous_email);
        }

        let Some(mut account) = self.accounts.get_mut(&id) else {
            return Ok(None);
        };
        account.email = email.to_string();
        account.password_hash = password_hash.to_string();
        account.updated_at = Utc::now();
        Ok(Some(account.value().clone()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let Some(id) = self.emails.get(email).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.get(&id).map(|a| a.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = MemoryAccountRepo::new();
        repo.create("a@x.com", "hash").await.unwrap();
        let err = repo.create("a@x.com", "other").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountExists));
    }

    #[tokio::test]
    async fn update_moves_email_index() {
        let repo = MemoryAccountRepo::new();
        let account = repo.create("a@x.com", "hash").await.unwrap();

        let updated = repo
            .update(account.id, "b@x.com", "hash2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "b@x.com");
        assert_eq!(updated.created_at, account.created_at);

        assert!(repo.get_by_email("a@x.com").await.unwrap().is_none());
        let found = repo.get_by_email("b@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert_eq!(found.password_hash, "hash2");
    }

    #[tokio::test]
    async fn update_to_taken_email_is_rejected() {
        let repo = MemoryAccountRepo::new();
        let first = repo.create("a@x.com", "hash").await.unwrap();
        repo.create("b@x.com", "hash").await.unwrap();

        let err = repo.update(first.id, "b@x.com", "hash").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountExists));
    }

    #[tokio::test]
    async fn update_unknown_account_returns_none() {
        let repo = MemoryAccountRepo::new();
        let res = repo
            .update(AccountId::new_random(), "a@x.com", "hash")
            .await
            .unwrap();
        assert!(res.is_none());
    }
}
