use crate::application_port::{AuthError, TokenService};
use crate::domain_model::UserId;
use crate::domain_port::RevocationStore;
use crate::logger::*;
use chrono::Duration;
use std::sync::Arc;

pub struct RealTokenService {
    store: Arc<dyn RevocationStore>,
}

impl RealTokenService {
    pub fn new(store: Arc<dyn RevocationStore>) -> Self {
        RealTokenService { store }
    }

    fn check_token(refresh_token: &str) -> Result<(), AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::validation(
                "refresh_token",
                "refresh token is empty",
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenService for RealTokenService {
    async fn save(
        &self,
        refresh_token: &str,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        Self::check_token(refresh_token)?;
        if !user_id.is_valid() {
            return Err(AuthError::validation(
                "user_id",
                "user id can't be less than zero",
            ));
        }
        if ttl <= Duration::zero() {
            return Err(AuthError::validation("ttl", "ttl must be positive"));
        }
        debug!(%user_id, ttl_secs = ttl.num_seconds(), "saving refresh token");
        self.store.set(refresh_token, user_id, ttl).await
    }

    async fn find(&self, refresh_token: &str) -> Result<UserId, AuthError> {
        Self::check_token(refresh_token)?;
        self.store
            .get(refresh_token)
            .await?
            .ok_or_else(|| AuthError::NotFound("refresh token".to_string()))
    }

    async fn remove(&self, refresh_token: &str) -> Result<(), AuthError> {
        Self::check_token(refresh_token)?;
        self.store.delete(refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryRevocationStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts backend calls and can be switched into a failing mode.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryRevocationStore,
        calls: AtomicUsize,
        broken: bool,
    }

    impl RecordingStore {
        fn broken() -> Self {
            RecordingStore {
                broken: true,
                ..Default::default()
            }
        }

        fn touch(&self) -> Result<(), AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(AuthError::Store("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl RevocationStore for RecordingStore {
        async fn set(
            &self,
            refresh_token: &str,
            user_id: UserId,
            ttl: Duration,
        ) -> Result<(), AuthError> {
            self.touch()?;
            self.inner.set(refresh_token, user_id, ttl).await
        }

        async fn get(&self, refresh_token: &str) -> Result<Option<UserId>, AuthError> {
            self.touch()?;
            self.inner.get(refresh_token).await
        }

        async fn delete(&self, refresh_token: &str) -> Result<(), AuthError> {
            self.touch()?;
            self.inner.delete(refresh_token).await
        }
    }

    fn service() -> (RealTokenService, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::default());
        (RealTokenService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn save_then_find_returns_owner() {
        let (service, _) = service();
        service
            .save("token-a", UserId(5), Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(service.find("token-a").await.unwrap(), UserId(5));
    }

    #[tokio::test]
    async fn removed_token_is_not_found() {
        let (service, _) = service();
        service
            .save("token-a", UserId(5), Duration::minutes(1))
            .await
            .unwrap();
        service.remove("token-a").await.unwrap();
        assert!(matches!(
            service.find("token-a").await,
            Err(AuthError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn never_saved_token_is_not_found() {
        let (service, _) = service();
        assert!(matches!(
            service.find("never-saved").await,
            Err(AuthError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (service, _) = service();
        service
            .save("token-a", UserId(1), Duration::minutes(1))
            .await
            .unwrap();
        service.remove("token-a").await.unwrap();
        service.remove("token-a").await.unwrap();
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_store() {
        let (service, store) = service();

        let err = service
            .save("", UserId(1), Duration::minutes(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation { param: "refresh_token", .. }));

        let err = service
            .save("token", UserId(-1), Duration::minutes(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation { param: "user_id", .. }));

        let err = service
            .save("token", UserId(1), Duration::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation { param: "ttl", .. }));

        assert!(matches!(
            service.find("").await,
            Err(AuthError::Validation { .. })
        ));
        assert!(matches!(
            service.remove("").await,
            Err(AuthError::Validation { .. })
        ));

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_faults_pass_through_unchanged() {
        let service = RealTokenService::new(Arc::new(RecordingStore::broken()));
        assert!(matches!(
            service.save("t", UserId(1), Duration::minutes(1)).await,
            Err(AuthError::Store(_))
        ));
        assert!(matches!(service.find("t").await, Err(AuthError::Store(_))));
        assert!(matches!(service.remove("t").await, Err(AuthError::Store(_))));
    }
}
