use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;

/// Wires stores and services together from settings.
pub struct Server {
    pub credential_service: Arc<dyn CredentialService>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let secret = SigningSecret::new(settings.auth.signing_secret.as_bytes());

        let server = match settings.auth.backend.as_str() {
            "memory" => {
                warn!("using the in-memory store; accounts and tokens are lost on exit");
                Self::in_memory(&secret)
            }
            "mysql" => {
                let url = settings
                    .database
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow!("database.url is required for the mysql backend"))?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(settings.database.max_connections)
                    .connect(url)
                    .await?;
                info!(max_connections = settings.database.max_connections, "connected to mysql");

                let account_repo: Arc<dyn AccountRepo> =
                    Arc::new(MySqlAccountRepo::new(pool.clone()));
                let refresh_repo: Arc<dyn RefreshTokenRepo> =
                    Arc::new(MySqlRefreshTokenRepo::new(pool.clone()));
                Self::assemble(account_repo, refresh_repo, &secret, Some(pool))
            }
            other => return Err(anyhow!("Unknown auth backend: {}", other)),
        };

        Ok(server)
    }

    pub fn in_memory(secret: &SigningSecret) -> Self {
        Self::from_stores(
            Arc::new(MemoryAccountRepo::new()),
            Arc::new(MemoryRefreshTokenRepo::new()),
            secret,
        )
    }

    /// Builds the services over caller-owned stores, without a pool to close.
    pub fn from_stores(
        account_repo: Arc<dyn AccountRepo>,
        refresh_repo: Arc<dyn RefreshTokenRepo>,
        secret: &SigningSecret,
    ) -> Self {
        Self::assemble(account_repo, refresh_repo, secret, None)
    }

    fn assemble(
        account_repo: Arc<dyn AccountRepo>,
        refresh_repo: Arc<dyn RefreshTokenRepo>,
        secret: &SigningSecret,
        pool: Option<MySqlPool>,
    ) -> Self {
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let token_codec: Arc<dyn SessionTokenCodec> = Arc::new(JwtHs256Codec::new(secret));
        let refresh_issuer = Arc::new(RefreshTokenIssuer::new(refresh_repo));

        let credential_service: Arc<dyn CredentialService> = Arc::new(RealCredentialService::new(
            account_repo,
            credential_hasher,
            token_codec,
            refresh_issuer,
        ));

        Server {
            credential_service,
            pool,
        }
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("mysql pool closed");
        }
    }
}
