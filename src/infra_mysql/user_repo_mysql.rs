use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlDatabaseError, MySqlRow};
use sqlx::{MySqlPool, Row};

const ER_DUP_ENTRY: u16 = 1062;

fn is_duplicate_entry(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|mysql_err| mysql_err.number() == ER_DUP_ENTRY),
        _ => false,
    }
}

/// `users` table, see `migrations/0001_users.sql`.
pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_user(row: MySqlRow) -> Result<User, AuthError> {
        let id: i64 = row
            .try_get("u_id")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let username: String = row
            .try_get("u_name")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let password_hash: String = row
            .try_get("u_password")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("create_at")
            .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(User {
            id: UserId(id),
            username,
            password_hash,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, AuthError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
INSERT INTO users (u_name, u_password, create_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate_entry(&e) {
                AuthError::AlreadyExists("user".to_string())
            } else {
                AuthError::Database(e.to_string())
            }
        })?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|e| AuthError::Database(format!("user id out of range: {e}")))?;

        Ok(User {
            id: UserId(id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT u_id, u_name, u_password, create_at
FROM users
WHERE u_name = ?
"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("query user by name: {e}")))?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT u_id, u_name, u_password, create_at
FROM users
WHERE u_id = ?
"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("query user by id: {e}")))?;

        row_opt.map(Self::row_to_user).transpose()
    }
}
