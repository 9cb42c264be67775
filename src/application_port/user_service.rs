use crate::application_port::AuthError;
use crate::domain_model::{User, UserId};

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, AuthError>;
    async fn get(&self, username: &str) -> Result<User, AuthError>;
    async fn get_by_id(&self, user_id: UserId) -> Result<User, AuthError>;
}
