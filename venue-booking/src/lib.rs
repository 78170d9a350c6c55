pub mod availability;
pub mod error;
pub mod mutex;
pub mod notifications;
pub mod orchestrator;
pub mod reference;

pub use availability::{AvailabilityService, BOOKED_REASON};
pub use error::{BookingError, BookingResult, LockError};
pub use mutex::{date_lock_key, KeyedMutex};
pub use notifications::{NotificationQueue, NotificationWorker, QueuedNotifier, RetryPolicy};
pub use orchestrator::{BookingOrchestrator, NewBooking, OrchestratorDeps};
pub use reference::generate_reference;
