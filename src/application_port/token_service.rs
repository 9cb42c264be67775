use crate::application_port::AuthError;
use crate::domain_model::UserId;
use chrono::Duration;

/// Input-checked access to refresh-token revocation records.
#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    async fn save(
        &self,
        refresh_token: &str,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), AuthError>;
    /// Fails with [`AuthError::NotFound`] when no live record exists, whether it
    /// was never saved, removed, or expired.
    async fn find(&self, refresh_token: &str) -> Result<UserId, AuthError>;
    /// Removing an absent record succeeds.
    async fn remove(&self, refresh_token: &str) -> Result<(), AuthError>;
}
