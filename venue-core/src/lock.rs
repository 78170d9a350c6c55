use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("Lock store unreachable: {0}")]
pub struct LockStoreError(pub String);

/// TTL key-value backend for the keyed mutex (Redis, or an in-process map)
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Atomically create `key = token` with a TTL if the key is absent or expired.
    /// `Ok(false)` means someone else holds it.
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, LockStoreError>;

    /// Delete `key` only if it currently stores `token`
    async fn delete_if_owned(&self, key: &str, token: &str) -> Result<bool, LockStoreError>;
}
