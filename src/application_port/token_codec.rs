use crate::domain_model::*;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("couldn't sign token: {0}")]
    Signing(String),
    #[error("invalid verification key: {0}")]
    Key(String),
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("signature rejected: {0}")]
    Signature(String),
    #[error("token expired")]
    Expired,
    #[error("token not valid yet")]
    NotYetValid,
    #[error("subject claim is missing or is not a user id")]
    InvalidSubject,
}

impl TokenError {
    /// Errors caused by our own key material rather than by the presented token.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, TokenError::Signing(_) | TokenError::Key(_))
    }
}

/// Issues and verifies the two token classes. Implementations are pure
/// functions of their input, the clock and keys loaded at construction.
pub trait TokenCodec: Send + Sync {
    fn create_access_token(
        &self,
        ttl: Duration,
        subject: Subject,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError>;

    fn create_refresh_token(
        &self,
        ttl: Duration,
        subject: Subject,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError>;

    fn validate_access_token(&self, token: &AccessToken) -> Result<Subject, TokenError>;

    fn validate_refresh_token(&self, token: &RefreshToken) -> Result<Subject, TokenError>;
}
