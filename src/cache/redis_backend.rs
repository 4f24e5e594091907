//! Dragonfly/Redis-backed `SharedCache`.
//!
//! Mirrors the connection pattern from the service entrypoint
//! (`redis::Client::open` + `ConnectionManager`, which transparently
//! reconnects), wrapped behind the `SharedCache` trait so the planner
//! never depends on `redis` directly.

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::cache::SharedCache;
use crate::error::{PlannerError, PlannerResult};

pub struct RedisSharedCache {
    connection: redis::aio::ConnectionManager,
}

impl RedisSharedCache {
    /// Connects to `redis_url` (already containing credentials, if any)
    /// and wraps the connection in a `ConnectionManager` for automatic
    /// reconnection.
    pub async fn connect(redis_url: &str) -> PlannerResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| PlannerError::UpstreamFailure(format!("invalid Redis URL: {e}")))?;
        let connection = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| PlannerError::UpstreamFailure(format!("failed to connect to Redis: {e}")))?;
        Ok(RedisSharedCache { connection })
    }
}

#[async_trait]
impl SharedCache for RedisSharedCache {
    async fn get(&self, key: &str) -> PlannerResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| PlannerError::UpstreamFailure(format!("Redis GET failed: {e}")))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> PlannerResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(|e| PlannerError::UpstreamFailure(format!("Redis SETEX failed: {e}")))?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }
}
