use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use venue_booking::{BookingOrchestrator, NotificationWorker, OrchestratorDeps, QueuedNotifier, RetryPolicy};
use venue_core::{
    AvailabilityRepository, BookingRepository, LockStore, NotificationDispatcher, NotificationSink, SystemClock,
    VenueDirectory,
};
use venue_shared::BookingSummary;
use venue_store::app_config::{Config, LockBackend, StorageBackend};
use venue_store::{
    DbClient, EventProducer, MemoryAvailabilityRepository, MemoryBookingRepository, MemoryLockStore,
    MemoryVenueDirectory, PgAvailabilityRepository, PgBookingRepository, PgVenueDirectory, RedisClient,
};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BookingOrchestrator>,
}

/// Everything `main` needs to start serving
pub struct Runtime {
    pub state: AppState,
    /// Present when notifications are enabled; must be spawned by the caller
    pub worker: Option<NotificationWorker>,
    /// Upper bound on waiting for the worker after the server stops
    pub shutdown_drain: Duration,
}

/// Stand-in dispatcher when confirmations are switched off
struct DisabledNotifier;

impl NotificationDispatcher for DisabledNotifier {
    fn enqueue_booking_confirmation(&self, summary: BookingSummary) {
        debug!("Notifications disabled, skipping confirmation for {}", summary.booking_reference);
    }
}

struct Stores {
    bookings: Arc<dyn BookingRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    venues: Arc<dyn VenueDirectory>,
}

async fn build_stores(config: &Config) -> anyhow::Result<Stores> {
    match config.booking.storage_backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database.url).await?;
            db.migrate().await?;
            info!("Using Postgres storage");
            Ok(Stores {
                bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
                availability: Arc::new(PgAvailabilityRepository::new(db.pool.clone())),
                venues: Arc::new(PgVenueDirectory::new(db.pool.clone())),
            })
        }
        StorageBackend::Memory => {
            let venues = MemoryVenueDirectory::new();
            for venue in &config.venues {
                venues.insert(venue.clone()).await;
            }
            info!("Using in-memory storage with {} venues", config.venues.len());
            Ok(Stores {
                bookings: Arc::new(MemoryBookingRepository::new()),
                availability: Arc::new(MemoryAvailabilityRepository::new()),
                venues: Arc::new(venues),
            })
        }
    }
}

async fn build_lock_store(config: &Config) -> anyhow::Result<Arc<dyn LockStore>> {
    match config.booking.lock_backend {
        LockBackend::Redis => {
            let client = RedisClient::new(&config.redis.url, config.booking.redis_timeout()).await?;
            info!("Using Redis lock store at {}", config.redis.url);
            Ok(Arc::new(client))
        }
        LockBackend::Memory => {
            info!("Using in-process lock store (single instance only)");
            Ok(Arc::new(MemoryLockStore::new()))
        }
    }
}

fn build_notifier(config: &Config) -> anyhow::Result<(Arc<dyn NotificationDispatcher>, Option<NotificationWorker>)> {
    let settings = &config.notifications;
    if !settings.enabled {
        info!("Booking confirmations disabled");
        return Ok((Arc::new(DisabledNotifier), None));
    }

    let sink: Arc<dyn NotificationSink> = Arc::new(EventProducer::new(&config.kafka.brokers, &settings.topic)?);
    let (notifier, queue) = QueuedNotifier::channel(settings.queue_capacity);
    let policy = RetryPolicy {
        backoff: settings.retry_backoff(),
        max_backoff: settings.max_backoff(),
        alert_after: settings.alert_after_attempts,
    };
    Ok((Arc::new(notifier), Some(NotificationWorker::new(queue, sink, policy))))
}

impl Runtime {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let stores = build_stores(config).await?;
        let locks = build_lock_store(config).await?;
        let (notifier, worker) = build_notifier(config)?;

        let orchestrator = BookingOrchestrator::new(OrchestratorDeps {
            bookings: stores.bookings,
            availability: stores.availability,
            venues: stores.venues,
            locks,
            notifier,
            clock: Arc::new(SystemClock),
            lock_ttl: config.booking.lock_ttl(),
        });

        Ok(Self {
            state: AppState {
                orchestrator: Arc::new(orchestrator),
            },
            worker,
            shutdown_drain: config.notifications.shutdown_drain(),
        })
    }
}
