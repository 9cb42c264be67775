use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use chrono::Duration;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Replace the refresh token on every refresh instead of keeping it until
    /// its TTL runs out.
    pub rotate_refresh_tokens: bool,
}

pub struct RealAuthService {
    user_service: Arc<dyn UserService>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    token_service: Arc<dyn TokenService>,
    policy: SessionPolicy,
}

impl RealAuthService {
    pub fn new(
        user_service: Arc<dyn UserService>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        token_service: Arc<dyn TokenService>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            user_service,
            credential_hasher,
            token_codec,
            token_service,
            policy,
        }
    }

    fn validate_signup(username: &str, password: &str) -> Result<(), AuthError> {
        if username.is_empty() {
            return Err(AuthError::validation("username", "empty username"));
        }
        if password.is_empty() {
            return Err(AuthError::validation("password", "empty password"));
        }
        Ok(())
    }

    // Unknown user and wrong password look the same to the caller.
    fn invalid_credentials() -> AuthError {
        AuthError::validation("credentials", "invalid username or password")
    }

    fn revoked() -> AuthError {
        AuthError::Unauthorized("refresh token revoked or expired".to_string())
    }

    fn missing_refresh_token() -> AuthError {
        AuthError::Unauthenticated("refresh token is missing".to_string())
    }

    fn verified_refresh_owner(&self, refresh_token: &str) -> Result<UserId, AuthError> {
        let subject = self
            .token_codec
            .validate_refresh_token(&RefreshToken(refresh_token.to_string()))?;
        Ok(UserId::try_from(subject)?)
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<User, AuthError> {
        let SignupInput { username, password } = request;

        Self::validate_signup(&username, &password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        self.user_service.create(&username, &password_hash).await
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { username, password } = request;

        let user = match self.user_service.get(&username).await {
            Ok(user) => user,
            Err(AuthError::NotFound(_)) => {
                debug!(username = %username, "sign-in for unknown user");
                return Err(Self::invalid_credentials());
            }
            Err(e) => return Err(e),
        };

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            debug!(user_id = %user.id, "sign-in with wrong password");
            return Err(Self::invalid_credentials());
        }

        let (access_token, access_exp) = self
            .token_codec
            .create_access_token(self.policy.access_ttl, user.id.into())?;
        let (refresh_token, refresh_exp) = self
            .token_codec
            .create_refresh_token(self.policy.refresh_ttl, user.id.into())?;

        // Tokens minted above are dropped unrecorded if this fails.
        self.token_service
            .save(&refresh_token.0, user.id, self.policy.refresh_ttl)
            .await?;

        info!(user_id = %user.id, "user signed in");

        Ok(LoginResult {
            user,
            tokens: AuthTokens {
                access_token,
                refresh_token,
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh_exp,
            },
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError> {
        if refresh_token.is_empty() {
            return Err(Self::missing_refresh_token());
        }

        let claimed = self.verified_refresh_owner(refresh_token)?;

        let user_id = match self.token_service.find(refresh_token).await {
            Ok(user_id) => user_id,
            Err(AuthError::NotFound(_)) => return Err(Self::revoked()),
            Err(e) => return Err(e),
        };
        if user_id != claimed {
            warn!(%user_id, %claimed, "refresh token record owned by another user");
            return Err(Self::revoked());
        }

        let (access_token, access_exp) = self
            .token_codec
            .create_access_token(self.policy.access_ttl, user_id.into())?;

        let rotated = if self.policy.rotate_refresh_tokens {
            let (next, next_exp) = self
                .token_codec
                .create_refresh_token(self.policy.refresh_ttl, user_id.into())?;
            self.token_service
                .save(&next.0, user_id, self.policy.refresh_ttl)
                .await?;
            self.token_service.remove(refresh_token).await?;
            Some((next, next_exp))
        } else {
            None
        };

        debug!(%user_id, rotated = rotated.is_some(), "access token refreshed");

        Ok(RefreshResult {
            access_token,
            access_token_expires_at: access_exp,
            rotated,
        })
    }

    async fn logout(&self, user: &User, refresh_token: &str) -> Result<(), AuthError> {
        if refresh_token.is_empty() {
            return Err(Self::missing_refresh_token());
        }

        let owner = self.verified_refresh_owner(refresh_token)?;
        if owner != user.id {
            return Err(AuthError::Unauthorized(
                "refresh token belongs to another user".to_string(),
            ));
        }

        self.token_service.remove(refresh_token).await?;
        info!(user_id = %user.id, "user signed out");
        Ok(())
    }

    async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::Unauthenticated(
                "access token is missing".to_string(),
            ));
        }

        let subject = self
            .token_codec
            .validate_access_token(&AccessToken(access_token.to_string()))?;
        let user_id = UserId::try_from(subject)?;

        self.user_service.get_by_id(user_id).await
    }
}
