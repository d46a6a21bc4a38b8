use super::util::{id_as_bytes, id_from_bytes, is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlAccountRepo {
    pool: MySqlPool,
}

impl MySqlAccountRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAccountRepo { pool }
    }

    fn row_to_account(row: MySqlRow) -> Result<Account, AuthError> {
        let id_bytes: Vec<u8> = row.try_get("id").map_err(store_err)?;
        let id = id_from_bytes(&id_bytes)?;

        let email: String = row.try_get("email").map_err(store_err)?;
        let password_hash: String = row.try_get("password_hash").map_err(store_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(store_err)?;

        Ok(Account {
            id,
            email,
            password_hash,
            created_at,
            updated_at,
        })
    }

    fn map_write_err(e: sqlx::Error) -> AuthError {
        if is_dup_key(&e) {
            AuthError::AccountExists
        } else {
            store_err(e)
        }
    }
}

#[async_trait::async_trait]
impl AccountRepo for MySqlAccountRepo {
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, AuthError> {
        let id = AccountId::new_random();
        let now = Utc::now();

        sqlx::query(
            r#"
INSERT INTO account (id, email, password_hash, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(id_as_bytes(&id))
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_err)?;

        Ok(Account {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        id: AccountId,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, AuthError> {
        let result = sqlx::query(
            r#"
UPDATE account
SET email = ?, password_hash = ?, updated_at = ?
WHERE id = ?
"#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id_as_bytes(&id))
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_err)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, email, password_hash, created_at, updated_at
FROM account
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_account).transpose()
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, email, password_hash, created_at, updated_at
FROM account
WHERE id = ?
"#,
        )
        .bind(id_as_bytes(&id))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_account).transpose()
    }
}
