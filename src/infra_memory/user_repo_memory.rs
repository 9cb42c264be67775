use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug)]
pub struct MemoryUserRepo {
    by_id: DashMap<UserId, User>,
    by_name: DashMap<String, UserId>,
    next_id: AtomicI64,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        MemoryUserRepo {
            by_id: DashMap::new(),
            by_name: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryUserRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, AuthError> {
        match self.by_name.entry(username.to_string()) {
            Entry::Occupied(_) => Err(AuthError::AlreadyExists("user".to_string())),
            Entry::Vacant(slot) => {
                let user = User {
                    id: UserId(self.next_id.fetch_add(1, Ordering::Relaxed)),
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at: Utc::now(),
                };
                self.by_id.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let Some(user_id) = self.by_name.get(username).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(user_id).await
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.by_id.get(&user_id).map(|user| user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn ids_are_assigned_in_sequence() {
        let repo = MemoryUserRepo::new();
        let a = repo.insert("a", "h").await.unwrap();
        let b = repo.insert("b", "h").await.unwrap();
        assert_eq!(a.id, UserId(1));
        assert_eq!(b.id, UserId(2));
    }

    #[tokio::test]
    async fn concurrent_signups_with_same_name_admit_one() {
        let repo = Arc::new(MemoryUserRepo::new());
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.insert("alice", "h").await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }
}
