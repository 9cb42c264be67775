use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Duration;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Writes between two sweeps of expired records.
const SWEEP_INTERVAL: usize = 64;

#[derive(Debug, Clone, Copy)]
struct Record {
    user_id: UserId,
    expires_at: Instant,
}

/// Revocation records kept in a concurrent map. A lookup never returns an
/// expired record, and every `SWEEP_INTERVAL` writes the map is swept so
/// tokens that are never presented again do not pile up.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    records: DashMap<String, Record>,
    writes: AtomicUsize,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired record and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| record.expires_at > now);
        let purged = before.saturating_sub(self.records.len());
        if purged > 0 {
            debug!(purged, "expired revocation records swept");
        }
        purged
    }
}

#[async_trait::async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn set(
        &self,
        refresh_token: &str,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        let ttl = ttl
            .to_std()
            .map_err(|e| AuthError::Store(format!("invalid ttl: {e}")))?;
        self.records.insert(
            refresh_token.to_string(),
            Record {
                user_id,
                expires_at: Instant::now() + ttl,
            },
        );
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            self.purge_expired();
        }
        Ok(())
    }

    async fn get(&self, refresh_token: &str) -> Result<Option<UserId>, AuthError> {
        let now = Instant::now();
        if let Some(record) = self.records.get(refresh_token) {
            if record.expires_at > now {
                return Ok(Some(record.user_id));
            }
        }
        self.records
            .remove_if(refresh_token, |_, record| record.expires_at <= now);
        Ok(None)
    }

    async fn delete(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.records.remove(refresh_token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_overwrites_previous_owner() {
        let store = MemoryRevocationStore::new();
        store.set("t", UserId(1), Duration::minutes(1)).await.unwrap();
        store.set("t", UserId(2), Duration::minutes(1)).await.unwrap();
        assert_eq!(store.get("t").await.unwrap(), Some(UserId(2)));
    }

    #[tokio::test]
    async fn record_disappears_after_ttl() {
        let store = MemoryRevocationStore::new();
        store
            .set("t", UserId(1), Duration::milliseconds(50))
            .await
            .unwrap();
        assert_eq!(store.get("t").await.unwrap(), Some(UserId(1)));

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        assert_eq!(store.get("t").await.unwrap(), None);
        assert!(store.records.is_empty());
    }

    #[tokio::test]
    async fn expired_records_are_swept_without_lookups() {
        let store = MemoryRevocationStore::new();
        for i in 0..SWEEP_INTERVAL {
            store
                .set(&format!("stale-{i}"), UserId(1), Duration::milliseconds(50))
                .await
                .unwrap();
        }
        assert_eq!(store.records.len(), SWEEP_INTERVAL);

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        for i in 0..SWEEP_INTERVAL {
            store
                .set(&format!("fresh-{i}"), UserId(2), Duration::minutes(1))
                .await
                .unwrap();
        }
        assert_eq!(store.records.len(), SWEEP_INTERVAL);
        assert!(store.records.iter().all(|r| r.key().starts_with("fresh-")));
    }

    #[tokio::test]
    async fn purge_keeps_live_records() {
        let store = MemoryRevocationStore::new();
        store
            .set("short", UserId(1), Duration::milliseconds(20))
            .await
            .unwrap();
        store.set("long", UserId(2), Duration::minutes(1)).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.records.len(), 1);
        assert_eq!(store.get("long").await.unwrap(), Some(UserId(2)));
    }

    #[tokio::test]
    async fn deleting_absent_key_succeeds() {
        let store = MemoryRevocationStore::new();
        store.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn negative_ttl_is_refused() {
        let store = MemoryRevocationStore::new();
        assert!(matches!(
            store.set("t", UserId(1), Duration::seconds(-1)).await,
            Err(AuthError::Store(_))
        ));
    }
}
