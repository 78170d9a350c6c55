pub mod clock;
pub mod identity;
pub mod lock;
pub mod notification;
pub mod repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use identity::{Actor, Role};
pub use lock::{LockStore, LockStoreError};
pub use notification::{NotificationDispatcher, NotificationSink};
pub use repository::{AvailabilityRepository, BookingRepository, RepoError, VenueDirectory};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
