use async_trait::async_trait;
use venue_shared::BookingSummary;

use crate::repository::RepoError;

/// Hand-off point used by the booking path. Must never block or fail the caller.
pub trait NotificationDispatcher: Send + Sync {
    fn enqueue_booking_confirmation(&self, summary: BookingSummary);
}

/// Downstream transport that actually delivers a notification (Kafka, logs, ...)
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, summary: &BookingSummary) -> Result<(), RepoError>;
}
