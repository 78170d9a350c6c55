use venue_core::RepoError;
use venue_shared::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Someone else holds the key. Never retried here.
    #[error("Lock {key} is held by another operation")]
    Contended { key: String },

    /// The backing store could not be reached; never treated as uncontended
    #[error("Lock store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Lock store unavailable: {0}")]
    LockUnavailable(String),

    #[error("Cannot {action} a booking in status {status}")]
    InvalidTransition {
        status: BookingStatus,
        action: &'static str,
    },

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<LockError> for BookingError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Contended { key } => {
                BookingError::Conflict(format!("{} is currently being reserved by another request", key))
            }
            LockError::Unavailable(msg) => BookingError::LockUnavailable(msg),
        }
    }
}

impl From<RepoError> for BookingError {
    fn from(err: RepoError) -> Self {
        BookingError::Storage(err.to_string())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
