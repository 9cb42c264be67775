use crate::application_port::*;
use crate::domain_model::*;
use chrono::Duration;

/// TTL-capable key-value backend holding `refresh token -> user id` records.
///
/// Each call touches a single key; implementations rely on the backend's own
/// atomicity for it.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    /// Upsert with an absolute expiry of now + `ttl`.
    async fn set(&self, refresh_token: &str, user_id: UserId, ttl: Duration)
    -> Result<(), AuthError>;
    /// `None` when the record is absent or expired.
    async fn get(&self, refresh_token: &str) -> Result<Option<UserId>, AuthError>;
    /// Deleting an absent key is not an error.
    async fn delete(&self, refresh_token: &str) -> Result<(), AuthError>;
}
