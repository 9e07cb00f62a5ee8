use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;

use super::KeyValueStore;
use crate::error::AppResult;

/// Creates a Redis client for the key-value store
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed store. Keys never expire.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects eagerly so a bad URL fails at startup rather than on first write
    pub async fn connect(client: Client) -> AppResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis store");
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis get failed");
            e
        })?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        tracing::debug!(key = %key, "Stored value in Redis");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_rejects_bad_url() {
        assert!(create_redis_client("not-a-redis-url").is_err());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let Ok(store) = RedisStore::connect(client.clone()).await else {
            eprintln!("skipping: no Redis at {}", redis_url);
            return;
        };

        let key = "movierec:test_set_then_get";
        store.set(key, "value".to_string()).await.unwrap();
        assert_eq!(store.get(key).await.unwrap(), Some("value".to_string()));

        // Clean up
        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key).await.unwrap();
    }
}
