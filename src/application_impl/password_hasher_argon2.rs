use crate::application_port::{AuthError, CredentialHasher};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tokio::task;

/// Argon2id with the crate's default cost parameters and a fresh salt per hash.
/// Both operations run on the blocking pool.
pub struct Argon2PasswordHasher;

fn hash_blocking(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .to_string();
    Ok(hash)
}

fn verify_blocking(password: &str, password_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AuthError::Hashing(format!("invalid PHC hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(argon2::password_hash::Error::Password) => Err(AuthError::PasswordMismatch),
        Err(e) => Err(AuthError::Hashing(format!("verify error: {}", e))),
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        task::spawn_blocking(move || hash_blocking(&password))
            .await
            .map_err(|e| AuthError::Hashing(format!("hash task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> Result<(), AuthError> {
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        task::spawn_blocking(move || verify_blocking(&password, &password_hash))
            .await
            .map_err(|e| AuthError::Hashing(format!("verify task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn hash_then_verify_round_trips() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash_password("purified_water").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("purified_water"));
        hasher.verify_password("purified_water", &hash).await.unwrap();
    }

    #[tokio::test]
    async fn wrong_password_is_a_mismatch() {
        let hasher = Argon2PasswordHasher;
        let hash = hasher.hash_password("secret123").await.unwrap();

        let err = hasher.verify_password("secret124", &hash).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
        let err = hasher.verify_password("", &hash).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
    }

    #[tokio::test]
    async fn same_password_hashes_differently() {
        let hasher = Argon2PasswordHasher;
        let first = hasher.hash_password("secret123").await.unwrap();
        let second = hasher.hash_password("secret123").await.unwrap();

        assert_ne!(first, second);
        hasher.verify_password("secret123", &first).await.unwrap();
        hasher.verify_password("secret123", &second).await.unwrap();
    }

    #[tokio::test]
    async fn unparsable_hash_is_a_hashing_error() {
        let hasher = Argon2PasswordHasher;
        let err = hasher
            .verify_password("secret123", "not-a-phc-string")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Hashing(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_leaves_the_runtime_free() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        let hash = Argon2PasswordHasher.hash_password("secret123").await.unwrap();
        assert!(ticks.load(Ordering::SeqCst) > 0);

        let before_verify = ticks.load(Ordering::SeqCst);
        Argon2PasswordHasher
            .verify_password("secret123", &hash)
            .await
            .unwrap();
        assert!(ticks.load(Ordering::SeqCst) > before_verify);
        ticker.abort();
    }
}
