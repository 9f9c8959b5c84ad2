//! Redis adapter for the dedup store.
//!
//! Uses `redis::aio::ConnectionManager` for async multiplexed connections
//! with automatic reconnection. The create-if-absent contract maps onto
//! `SET key value NX EX ttl`, which is atomic on the server side and
//! therefore correct under any number of concurrent consumers.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use eventide_server_domain::{KeyValueStore, KvError};

#[derive(Clone)]
pub struct RedisKvStore {
    connection: redis::aio::ConnectionManager,
}

impl std::fmt::Debug for RedisKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKvStore")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisKvStore {
    /// Connect to Redis at `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = redis::Client::open(url)
            .map_err(|e| KvError::Connection(format!("failed to create Redis client: {e}")))?;

        let connection = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| KvError::Connection(format!("failed to connect to Redis: {e}")))?;

        debug!("Redis dedup store connected");
        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValueStore for RedisKvStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, KvError> {
        let mut conn = self.connection.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        // SET NX EX replies "OK" on create and nil when the key exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| KvError::Backend(format!("Redis SET NX failed: {e}")))?;

        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut conn = self.connection.clone();

        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| KvError::Backend(format!("Redis DEL failed: {e}")))?;

        Ok(())
    }
}
