use super::util::{id_as_bytes, id_from_bytes, is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlRefreshTokenRepo {
    pool: MySqlPool,
}

impl MySqlRefreshTokenRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshTokenRecord, AuthError> {
        let token: String = row.try_get("token").map_err(store_err)?;
        let account_bytes: Vec<u8> = row.try_get("account_id").map_err(store_err)?;
        let account_id = id_from_bytes(&account_bytes)?;

        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(store_err)?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(store_err)?;
        let revoked_at: Option<DateTime<Utc>> = row.try_get("revoked_at").map_err(store_err)?;

        Ok(RefreshTokenRecord {
            token,
            account_id,
            created_at,
            updated_at,
            expires_at,
            revoked_at,
        })
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MySqlRefreshTokenRepo {
    async fn insert(
        &self,
        token: &str,
        account_id: AccountId,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord, AuthError> {
        let now = Utc::now();

        sqlx::query(
            r#"
INSERT INTO refresh_token (token, account_id, created_at, updated_at, expires_at, revoked_at)
VALUES (?, ?, ?, ?, ?, NULL)
"#,
        )
        .bind(token)
        .bind(id_as_bytes(&account_id))
        .bind(now)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::TokenCollision
            } else {
                store_err(e)
            }
        })?;

        Ok(RefreshTokenRecord {
            token: token.to_string(),
            account_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        })
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token, account_id, created_at, updated_at, expires_at, revoked_at
FROM refresh_token
WHERE token = ?
"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        // Lookup is exact even if the column carries a case-insensitive collation.
        Ok(row_opt
            .map(Self::row_to_record)
            .transpose()?
            .filter(|record| record.token == token))
    }

    async fn set_revoked(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
UPDATE refresh_token
SET revoked_at = COALESCE(revoked_at, ?), updated_at = ?
WHERE token = ?
"#,
        )
        .bind(revoked_at)
        .bind(updated_at)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }
}
