use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with [`AuthError::AlreadyExists`] when the username is taken.
    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, AuthError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError>;
}
