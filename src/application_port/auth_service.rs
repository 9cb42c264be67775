use crate::application_port::TokenError;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{message}")]
    Validation {
        param: &'static str,
        message: String,
    },
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("store error: {0}")]
    Store(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    pub fn validation(param: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            param,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub access_token: AccessToken,
    pub access_token_expires_at: DateTime<Utc>,
    /// Present only when refresh-token rotation is enabled.
    pub rotated: Option<(RefreshToken, DateTime<Utc>)>,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<User, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, AuthError>;
    async fn logout(&self, user: &User, refresh_token: &str) -> Result<(), AuthError>;
    /// Resolves the owner of an access token.
    async fn authenticate(&self, access_token: &str) -> Result<User, AuthError>;
}
