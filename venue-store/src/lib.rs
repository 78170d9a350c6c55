pub mod app_config;
pub mod availability_repo;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod memory;
pub mod redis_repo;
pub mod venue_repo;

pub use availability_repo::PgAvailabilityRepository;
pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use memory::{
    MemoryAvailabilityRepository, MemoryBookingRepository, MemoryLockStore, MemoryNotificationSink,
    MemoryVenueDirectory,
};
pub use redis_repo::RedisClient;
pub use venue_repo::PgVenueDirectory;
