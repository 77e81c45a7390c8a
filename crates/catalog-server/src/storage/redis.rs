//! Redis record cache, one hash per container

use anyhow::{Context, Result};
use async_trait::async_trait;
use catalog_core::error::{CacheError, CacheResult};
use catalog_core::ports::CacheEntries;
use catalog_core::RecordCache;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};

#[derive(Clone)]
pub struct RedisRecordCache {
    conn: ConnectionManager,
}

impl RedisRecordCache {
    pub async fn connect(url: &str) -> Result<Self> {
        tracing::info!("Connecting to Redis");

        let client = redis::Client::open(url).context("Invalid Redis URL")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        let cache = Self { conn };
        cache.ping().await.context("Redis did not answer PING")?;

        tracing::info!("Redis connection established");
        Ok(cache)
    }
}

fn map_redis_error(e: RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_timeout() || e.is_connection_dropped()
    {
        CacheError::Connection(e.to_string())
    } else {
        CacheError::Protocol(e.to_string())
    }
}

#[async_trait]
impl RecordCache for RedisRecordCache {
    async fn get_all(&self, container: &str) -> CacheResult<CacheEntries> {
        let mut conn = self.conn.clone();
        conn.hgetall(container).await.map_err(map_redis_error)
    }

    async fn get(&self, container: &str, field: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.hget(container, field).await.map_err(map_redis_error)
    }

    async fn set(&self, container: &str, field: &str, value: String) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(container, field, value)
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, container: &str, field: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.hdel(container, field).await.map_err(map_redis_error)?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}
