use crate::api::v1::CookiePolicy;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use chrono::Duration;
use jsonwebtoken::Algorithm;
use sqlx::MySqlPool;
use std::str::FromStr;
use std::sync::Arc;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub cookie_policy: Arc<CookiePolicy>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let mut pool = None;
        let user_repo: Arc<dyn UserRepo> = match settings.user.backend.as_str() {
            "memory" => Arc::new(MemoryUserRepo::new()),
            "mysql" => {
                let dsn = settings
                    .user
                    .dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("user.dsn is required for the mysql backend"))?;
                let mysql = MySqlPool::connect(dsn).await?;
                sqlx::migrate!("./migrations").run(&mysql).await?;
                pool = Some(mysql.clone());
                Arc::new(MySqlUserRepo::new(mysql))
            }
            other => return Err(anyhow!("Unknown user backend: {}", other)),
        };

        let revocation_store: Arc<dyn RevocationStore> =
            match settings.revocation.backend.as_str() {
                "memory" => Arc::new(MemoryRevocationStore::new()),
                "redis" => {
                    let dsn = settings.revocation.dsn.as_deref().ok_or_else(|| {
                        anyhow!("revocation.dsn is required for the redis backend")
                    })?;
                    let redis_client = redis::Client::open(dsn)?;
                    let redis_manager = redis_client.get_connection_manager().await?;
                    Arc::new(RedisRevocationStore::new(
                        redis_manager,
                        settings.revocation.prefix.clone(),
                    ))
                }
                other => return Err(anyhow!("Unknown revocation backend: {}", other)),
            };

        let token = &settings.token;
        if token.access_ttl_minutes <= 0 || token.refresh_ttl_minutes <= 0 {
            return Err(anyhow!("token TTLs must be positive"));
        }
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtCodec::new(JwtConfig {
            algorithm: Algorithm::from_str(&token.algorithm)?,
            access: TokenPair::from_base64(&token.access_private_key, &token.access_public_key)?,
            refresh: TokenPair::from_base64(
                &token.refresh_private_key,
                &token.refresh_public_key,
            )?,
        })?);
        let policy = SessionPolicy {
            access_ttl: Duration::minutes(token.access_ttl_minutes),
            refresh_ttl: Duration::minutes(token.refresh_ttl_minutes),
            rotate_refresh_tokens: token.rotate_refresh_tokens,
        };

        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(user_repo));
        let token_service: Arc<dyn TokenService> =
            Arc::new(RealTokenService::new(revocation_store));
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_service,
            credential_hasher,
            token_codec,
            token_service,
            policy,
        ));

        info!(
            user_backend = %settings.user.backend,
            revocation_backend = %settings.revocation.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            cookie_policy: Arc::new(CookiePolicy::from(&settings.cookie)),
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
