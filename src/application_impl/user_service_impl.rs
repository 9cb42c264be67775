use crate::application_port::{AuthError, UserService};
use crate::domain_model::{User, UserId};
use crate::domain_port::UserRepo;
use crate::logger::*;
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>) -> RealUserService {
        RealUserService { user_repo }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, AuthError> {
        if username.is_empty() {
            return Err(AuthError::validation("username", "empty username"));
        }
        if password_hash.is_empty() {
            return Err(AuthError::validation("password", "empty password"));
        }
        let user = self.user_repo.insert(username, password_hash).await?;
        info!(user_id = %user.id, username, "user created");
        Ok(user)
    }

    async fn get(&self, username: &str) -> Result<User, AuthError> {
        if username.is_empty() {
            return Err(AuthError::validation("username", "empty username"));
        }
        debug!(username, "looking up user by name");
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthError::NotFound("user".to_string()))
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<User, AuthError> {
        if !user_id.is_valid() {
            return Err(AuthError::validation("user_id", "user id can't be less than zero"));
        }
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("user".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryUserRepo;

    fn service() -> RealUserService {
        RealUserService::new(Arc::new(MemoryUserRepo::new()))
    }

    #[tokio::test]
    async fn created_user_can_be_found_by_name_and_id() {
        let service = service();
        let user = service.create("alice", "hash").await.unwrap();

        assert_eq!(service.get("alice").await.unwrap(), user);
        assert_eq!(service.get_by_id(user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn empty_fields_are_rejected() {
        let service = service();
        assert!(matches!(
            service.create("", "hash").await,
            Err(AuthError::Validation { param: "username", .. })
        ));
        assert!(matches!(
            service.create("bob", "").await,
            Err(AuthError::Validation { param: "password", .. })
        ));
        assert!(matches!(
            service.get("").await,
            Err(AuthError::Validation { param: "username", .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_username_already_exists() {
        let service = service();
        service.create("alice", "hash").await.unwrap();
        assert!(matches!(
            service.create("alice", "other").await,
            Err(AuthError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let service = service();
        assert!(matches!(service.get("ghost").await, Err(AuthError::NotFound(_))));
        assert!(matches!(
            service.get_by_id(UserId(99)).await,
            Err(AuthError::NotFound(_))
        ));
    }
}
