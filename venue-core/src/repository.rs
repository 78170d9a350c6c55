use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;
use venue_shared::{AvailabilityRecord, Booking, Venue};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for booking persistence.
/// Soft-deleted bookings are invisible to every read.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), RepoError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError>;

    /// Overwrite the stored booking only if its stored version is still
    /// `expected_version`. `booking.version` is written as the new version.
    /// Returns `false` when the guard did not match.
    async fn update_booking(&self, booking: &Booking, expected_version: i64) -> Result<bool, RepoError>;

    /// The PENDING or CONFIRMED booking holding `date`, if any
    async fn find_active_booking(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Booking>, RepoError>;

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Booking>, RepoError>;

    async fn list_by_venue(&self, venue_id: Uuid) -> Result<Vec<Booking>, RepoError>;
}

/// Repository trait for per-date availability. Performs no locking: writers
/// must hold the date mutex.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn get_record(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityRecord>, RepoError>;

    async fn upsert_record(&self, record: &AvailabilityRecord) -> Result<(), RepoError>;
}

/// Read-only view of venue capacity and pricing
#[async_trait]
pub trait VenueDirectory: Send + Sync {
    async fn get_venue(&self, venue_id: Uuid) -> Result<Option<Venue>, RepoError>;
}
