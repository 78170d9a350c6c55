use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use venue_core::{LockStore, LockStoreError};

// Compare-and-delete: only the token that created the key may remove it
const RELEASE_SCRIPT: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("DEL", KEYS[1])
    else
        return 0
    end
"#;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    op_timeout: Duration,
}

impl RedisClient {
    pub async fn new(connection_string: &str, op_timeout: Duration) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client, op_timeout })
    }

    /// Runs a Redis round trip under the operation timeout. Timeouts and
    /// transport errors both read as "store unreachable".
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, LockStoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("Redis {} failed: {}", op, e);
                Err(LockStoreError(e.to_string()))
            }
            Err(_) => {
                warn!("Redis {} timed out after {:?}", op, self.op_timeout);
                Err(LockStoreError(format!("{} timed out", op)))
            }
        }
    }
}

#[async_trait]
impl LockStore for RedisClient {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, LockStoreError> {
        let ttl_ms = ttl.as_millis().max(1) as u64;
        let result: Option<String> = self
            .bounded("SET NX", async {
                let mut conn = self.client.get_multiplexed_async_connection().await?;
                // SET NX PX: only set if key does not exist, expire after ttl
                let reply: Option<String> = redis::cmd("SET")
                    .arg(key)
                    .arg(token)
                    .arg("NX")
                    .arg("PX")
                    .arg(ttl_ms)
                    .query_async(&mut conn)
                    .await?;
                Ok::<_, redis::RedisError>(reply)
            })
            .await?;

        debug!("Lock {} acquire attempt: {}", key, result.is_some());
        Ok(result.is_some())
    }

    async fn delete_if_owned(&self, key: &str, token: &str) -> Result<bool, LockStoreError> {
        let deleted: i64 = self
            .bounded("release", async {
                let mut conn = self.client.get_multiplexed_async_connection().await?;
                let script = redis::Script::new(RELEASE_SCRIPT);
                let removed: i64 = script.key(key).arg(token).invoke_async(&mut conn).await?;
                Ok::<_, redis::RedisError>(removed)
            })
            .await?;

        Ok(deleted == 1)
    }
}
