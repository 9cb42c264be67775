use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, ToRedisArgs, Value,
};
use sha2::{Digest, Sha256};

/// Revocation records as `SET EX` keys. Expiry is left entirely to Redis.
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRevocationStore {
            conn,
            prefix: prefix.into(),
        }
    }

    // Bearer tokens are not stored in clear; the digest keeps keys short too.
    fn key(&self, refresh_token: &str) -> String {
        let digest = Sha256::digest(refresh_token.as_bytes());
        format!("{}:{}", self.prefix, hex::encode(digest))
    }
}

impl ToRedisArgs for UserId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.0.to_string().as_bytes())
    }
}

impl FromRedisValue for UserId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let user_id = s.parse::<UserId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid UserId string",
                e.to_string(),
            ))
        })?;
        Ok(user_id)
    }
}

#[async_trait::async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn set(
        &self,
        refresh_token: &str,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        let ttl_secs = u64::try_from(ttl.num_seconds())
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| AuthError::Store(format!("ttl out of range: {ttl}")))?;
        let key = self.key(refresh_token);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, &user_id, ttl_secs)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, refresh_token: &str) -> Result<Option<UserId>, AuthError> {
        let key = self.key(refresh_token);
        let mut conn = self.conn.clone();
        let val: Option<UserId> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val)
    }

    async fn delete(&self, refresh_token: &str) -> Result<(), AuthError> {
        let key = self.key(refresh_token);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_parses_from_bulk_string() {
        let value = Value::BulkString(b"42".to_vec());
        assert_eq!(UserId::from_redis_value(&value).unwrap(), UserId(42));
    }

    #[test]
    fn garbage_user_id_is_a_type_error() {
        let value = Value::BulkString(b"forty-two".to_vec());
        let err = UserId::from_redis_value(&value).unwrap_err();
        assert_eq!(err.kind(), redis::ErrorKind::TypeError);
    }

    #[test]
    fn user_id_writes_decimal_argument() {
        assert_eq!(UserId(-7).to_redis_args(), vec![b"-7".to_vec()]);
    }
}
