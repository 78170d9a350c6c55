use serde::Deserialize;
use std::env;
use std::time::Duration;
use venue_shared::Venue;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub booking: BookingRules,
    pub notifications: NotificationSettings,
    /// Venues preloaded into the in-memory directory
    #[serde(default)]
    pub venues: Vec<Venue>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LockBackend {
    Redis,
    /// In-process map; only safe with a single API instance
    Memory,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_seconds: u64,
    #[serde(default = "default_lock_backend")]
    pub lock_backend: LockBackend,
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,
    #[serde(default = "default_redis_timeout")]
    pub redis_timeout_ms: u64,
}

impl BookingRules {
    /// A zero TTL would make every lock expire as it is taken, leaving the
    /// date mutex open to any concurrent writer.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.lock_ttl_seconds == 0 {
            return Err(invalid("booking.lock_ttl_seconds must be at least 1"));
        }
        if self.redis_timeout_ms == 0 {
            return Err(invalid("booking.redis_timeout_ms must be at least 1"));
        }
        Ok(())
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_seconds)
    }

    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }
}

fn default_lock_ttl() -> u64 { 10 }
fn default_lock_backend() -> LockBackend { LockBackend::Redis }
fn default_storage_backend() -> StorageBackend { StorageBackend::Postgres }
fn default_redis_timeout() -> u64 { 500 }

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub topic: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// Failed attempts between error-level alerts for a stuck delivery
    #[serde(default = "default_alert_after")]
    pub alert_after_attempts: u32,
    /// How long shutdown waits for queued confirmations to drain
    #[serde(default = "default_shutdown_drain")]
    pub shutdown_drain_secs: u64,
}

impl NotificationSettings {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.queue_capacity == 0 {
            return Err(invalid("notifications.queue_capacity must be at least 1"));
        }
        if self.max_backoff_ms < self.retry_backoff_ms {
            return Err(invalid("notifications.max_backoff_ms must not be below retry_backoff_ms"));
        }
        if self.alert_after_attempts == 0 {
            return Err(invalid("notifications.alert_after_attempts must be at least 1"));
        }
        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn shutdown_drain(&self) -> Duration {
        Duration::from_secs(self.shutdown_drain_secs)
    }
}

fn default_true() -> bool { true }
fn default_queue_capacity() -> usize { 1024 }
fn default_retry_backoff() -> u64 { 200 }
fn default_max_backoff() -> u64 { 30_000 }
fn default_alert_after() -> u32 { 10 }
fn default_shutdown_drain() -> u64 { 10 }

fn invalid(msg: &str) -> config::ConfigError {
    config::ConfigError::Message(msg.to_string())
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `VENUE__BOOKING__LOCK_TTL_SECONDS=5`
            .add_source(config::Environment::with_prefix("VENUE").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.booking.validate()?;
        self.notifications.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Partial {
        booking: BookingRules,
        notifications: NotificationSettings,
    }

    fn parse(source: &str) -> Partial {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_booking_rules_defaults() {
        let parsed = parse(
            r#"
            [booking]
            redis_timeout_ms = 250

            [notifications]
            topic = "t"
        "#,
        );

        assert_eq!(parsed.booking.lock_ttl(), Duration::from_secs(10));
        assert_eq!(parsed.booking.redis_timeout(), Duration::from_millis(250));
        assert_eq!(parsed.booking.lock_backend, LockBackend::Redis);
        assert_eq!(parsed.booking.storage_backend, StorageBackend::Postgres);
        assert!(parsed.booking.validate().is_ok());
        assert!(parsed.notifications.enabled);
        assert_eq!(parsed.notifications.alert_after_attempts, 10);
        assert_eq!(parsed.notifications.max_backoff(), Duration::from_secs(30));
        assert!(parsed.notifications.validate().is_ok());
    }

    #[test]
    fn test_zero_lock_ttl_is_rejected() {
        let parsed = parse(
            r#"
            [booking]
            lock_ttl_seconds = 0

            [notifications]
            topic = "t"
        "#,
        );

        let err = parsed.booking.validate().unwrap_err();
        assert!(err.to_string().contains("lock_ttl_seconds"));
    }

    #[test]
    fn test_zero_queue_capacity_is_rejected() {
        let parsed = parse(
            r#"
            [booking]

            [notifications]
            topic = "t"
            queue_capacity = 0
        "#,
        );

        assert!(parsed.notifications.validate().is_err());
    }
}
