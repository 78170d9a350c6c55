use chrono::NaiveDate;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use venue_core::LockStore;

use crate::error::LockError;

/// Lock key scoping mutual exclusion to one venue on one date
pub fn date_lock_key(venue_id: Uuid, date: NaiveDate) -> String {
    format!("venue:{}:date:{}", venue_id, date.format("%Y-%m-%d"))
}

/// Fail-fast named locks over a TTL key-value store.
///
/// There is no waiting and no retry: a held key is reported immediately and the
/// caller decides what to do. A crashed holder is recovered by the TTL alone.
#[derive(Clone)]
pub struct KeyedMutex {
    store: Arc<dyn LockStore>,
}

impl KeyedMutex {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self { store }
    }

    /// Try once to take `key`. `Ok(None)` means it is held elsewhere.
    pub async fn acquire(&self, key: &str, ttl: Duration) -> Result<Option<String>, LockError> {
        // A zero TTL expires on write and would grant the key to everyone
        if ttl.is_zero() {
            error!("Refusing to acquire {} with a zero TTL", key);
            return Err(LockError::Unavailable("lock TTL must be non-zero".to_string()));
        }
        let token = Uuid::new_v4().simple().to_string();

        match self.store.set_if_absent(key, &token, ttl).await {
            Ok(true) => {
                debug!("Acquired lock {} for {:?}", key, ttl);
                Ok(Some(token))
            }
            Ok(false) => {
                info!("Lock {} is contended", key);
                Ok(None)
            }
            Err(e) => {
                error!("Lock store unreachable while acquiring {}: {}", key, e);
                Err(LockError::Unavailable(e.to_string()))
            }
        }
    }

    /// Release `key` only if `token` still owns it. A mismatch means our TTL
    /// ran out and someone else took the key; it is logged and ignored.
    pub async fn release(&self, key: &str, token: &str) -> bool {
        match self.store.delete_if_owned(key, token).await {
            Ok(true) => {
                debug!("Released lock {}", key);
                true
            }
            Ok(false) => {
                warn!("Lock {} no longer owned by this holder (expired before release)", key);
                false
            }
            Err(e) => {
                warn!("Could not release lock {}, leaving it to expire: {}", key, e);
                false
            }
        }
    }

    pub async fn with_lock<T, E, F, Fut>(&self, key: &str, ttl: Duration, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        self.with_locks(&[key.to_string()], ttl, f).await
    }

    /// Take every key, run `f`, then release on every exit path (including a
    /// panic inside `f`, which is resumed after release).
    ///
    /// Keys are acquired in lexicographic order whatever order the caller
    /// passes, so two operations over the same pair cannot interleave into a
    /// deadlock-shaped failure.
    pub async fn with_locks<T, E, F, Fut>(&self, keys: &[String], ttl: Duration, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let mut ordered: Vec<&str> = keys.iter().map(String::as_str).collect();
        ordered.sort_unstable();
        ordered.dedup();

        let mut held: Vec<(&str, String)> = Vec::with_capacity(ordered.len());
        for key in ordered {
            match self.acquire(key, ttl).await {
                Ok(Some(token)) => held.push((key, token)),
                Ok(None) => {
                    self.release_all(&held).await;
                    return Err(LockError::Contended { key: key.to_string() }.into());
                }
                Err(e) => {
                    self.release_all(&held).await;
                    return Err(e.into());
                }
            }
        }

        let outcome = AssertUnwindSafe(f()).catch_unwind().await;
        self.release_all(&held).await;

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn release_all(&self, held: &[(&str, String)]) {
        for (key, token) in held.iter().rev() {
            self.release(key, token).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venue_store::MemoryLockStore;

    const TTL: Duration = Duration::from_secs(5);

    #[derive(Debug, PartialEq)]
    enum TestError {
        Lock(String),
        Inner,
    }

    impl From<LockError> for TestError {
        fn from(e: LockError) -> Self {
            TestError::Lock(e.to_string())
        }
    }

    fn mutex() -> (Arc<MemoryLockStore>, KeyedMutex) {
        let store = Arc::new(MemoryLockStore::new());
        (store.clone(), KeyedMutex::new(store))
    }

    #[test]
    fn test_lock_key_format() {
        let venue = Uuid::nil();
        let date = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        assert_eq!(
            date_lock_key(venue, date),
            "venue:00000000-0000-0000-0000-000000000000:date:2025-12-25"
        );
    }

    #[tokio::test]
    async fn test_acquire_fails_fast_when_held() {
        let (_, mutex) = mutex();
        let token = mutex.acquire("k", TTL).await.unwrap();
        assert!(token.is_some());
        assert!(mutex.acquire("k", TTL).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_never_granted() {
        let (store, mutex) = mutex();

        let result = mutex.acquire("k", Duration::ZERO).await;
        assert!(matches!(result, Err(LockError::Unavailable(_))));
        assert!(mutex.acquire("k", Duration::ZERO).await.is_err());
        assert!(store.holder("k").await.is_none());
    }

    #[tokio::test]
    async fn test_release_with_wrong_token_is_noop() {
        let (store, mutex) = mutex();
        let token = mutex.acquire("k", TTL).await.unwrap().unwrap();

        assert!(!mutex.release("k", "someone-else").await);
        assert_eq!(store.holder("k").await, Some(token.clone()));
        assert!(mutex.release("k", &token).await);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable_not_granted() {
        let (store, mutex) = mutex();
        store.set_offline(true);

        let result = mutex.acquire("k", TTL).await;
        assert!(matches!(result, Err(LockError::Unavailable(_))));

        let ran = std::sync::atomic::AtomicBool::new(false);
        let result: Result<(), TestError> = mutex
            .with_lock("k", TTL, || async {
                ran.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(TestError::Lock(_))));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_with_lock_releases_after_error() {
        let (store, mutex) = mutex();
        let result: Result<(), TestError> = mutex.with_lock("k", TTL, || async { Err(TestError::Inner) }).await;

        assert_eq!(result, Err(TestError::Inner));
        assert!(store.holder("k").await.is_none());
        assert!(mutex.acquire("k", TTL).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_with_lock_releases_after_panic() {
        let (store, mutex) = mutex();
        let m = mutex.clone();
        let handle = tokio::spawn(async move {
            let _: Result<(), TestError> = m
                .with_lock("k", TTL, || async {
                    let explode = true;
                    if explode {
                        panic!("boom");
                    }
                    Ok(())
                })
                .await;
        });

        assert!(handle.await.unwrap_err().is_panic());
        assert!(store.holder("k").await.is_none());
        assert!(mutex.acquire("k", TTL).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_with_lock_reports_contention() {
        let (_, mutex) = mutex();
        let _held = mutex.acquire("k", TTL).await.unwrap().unwrap();

        let result: Result<(), TestError> = mutex.with_lock("k", TTL, || async { Ok(()) }).await;
        assert!(matches!(result, Err(TestError::Lock(msg)) if msg.contains("held by another")));
    }

    #[tokio::test]
    async fn test_with_locks_releases_partial_acquisition() {
        let (store, mutex) = mutex();
        let _held = mutex.acquire("b", TTL).await.unwrap().unwrap();

        let keys = vec!["b".to_string(), "a".to_string()];
        let result: Result<(), TestError> = mutex.with_locks(&keys, TTL, || async { Ok(()) }).await;

        assert!(result.is_err());
        // "a" sorts first and was taken before "b" failed; it must be released
        assert!(store.holder("a").await.is_none());
    }

    #[tokio::test]
    async fn test_with_locks_holds_all_keys_during_body() {
        let (store, mutex) = mutex();
        let keys = vec!["y".to_string(), "x".to_string(), "y".to_string()];

        let seen = mutex
            .with_locks(&keys, TTL, || async {
                Ok::<_, TestError>((store.holder("x").await.is_some(), store.holder("y").await.is_some()))
            })
            .await
            .unwrap();

        assert_eq!(seen, (true, true));
        assert!(store.holder("x").await.is_none());
        assert!(store.holder("y").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_lock_becomes_acquirable() {
        let (_, mutex) = mutex();
        let stale = mutex.acquire("k", Duration::from_millis(50)).await.unwrap().unwrap();
        tokio::time::advance(Duration::from_millis(60)).await;

        let fresh = mutex.acquire("k", TTL).await.unwrap().unwrap();
        assert!(!mutex.release("k", &stale).await);
        assert!(mutex.release("k", &fresh).await);
    }
}
