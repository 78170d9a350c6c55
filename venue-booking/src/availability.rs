use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use venue_core::{AvailabilityRepository, Clock, RepoError};
use venue_shared::AvailabilityRecord;

/// Blackout reason written when a booking takes a date
pub const BOOKED_REASON: &str = "BOOKED";

/// Per-date bookable/blocked state.
///
/// Writes are plain upserts with no locking: callers must hold the date mutex
/// for (venue, date) before calling `mark_*`.
#[derive(Clone)]
pub struct AvailabilityService {
    repo: Arc<dyn AvailabilityRepository>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(repo: Arc<dyn AvailabilityRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// A date with no record is available
    pub async fn is_available(&self, venue_id: Uuid, date: NaiveDate) -> Result<bool, RepoError> {
        Ok(self.record(venue_id, date).await?.is_available)
    }

    pub async fn record(&self, venue_id: Uuid, date: NaiveDate) -> Result<AvailabilityRecord, RepoError> {
        let record = self.repo.get_record(venue_id, date).await?;
        Ok(record.unwrap_or_else(|| AvailabilityRecord::open(venue_id, date)))
    }

    pub async fn mark_unavailable(&self, venue_id: Uuid, date: NaiveDate, reason: &str) -> Result<(), RepoError> {
        debug!("Marking {} unavailable on {}: {}", venue_id, date, reason);
        self.repo
            .upsert_record(&AvailabilityRecord {
                venue_id,
                date,
                is_available: false,
                blackout_reason: Some(reason.to_string()),
                updated_at: Some(self.clock.now()),
            })
            .await
    }

    pub async fn mark_available(&self, venue_id: Uuid, date: NaiveDate) -> Result<(), RepoError> {
        debug!("Marking {} available on {}", venue_id, date);
        self.repo
            .upsert_record(&AvailabilityRecord {
                venue_id,
                date,
                is_available: true,
                blackout_reason: None,
                updated_at: Some(self.clock.now()),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venue_core::SystemClock;
    use venue_store::MemoryAvailabilityRepository;

    fn service() -> AvailabilityService {
        AvailabilityService::new(Arc::new(MemoryAvailabilityRepository::new()), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_missing_record_reads_as_available() {
        let svc = service();
        let date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(svc.is_available(Uuid::new_v4(), date).await.unwrap());
    }

    #[tokio::test]
    async fn test_marks_are_idempotent_upserts() {
        let svc = service();
        let venue = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        svc.mark_unavailable(venue, date, "maintenance").await.unwrap();
        svc.mark_unavailable(venue, date, "maintenance").await.unwrap();
        let record = svc.record(venue, date).await.unwrap();
        assert!(!record.is_available);
        assert_eq!(record.blackout_reason.as_deref(), Some("maintenance"));

        svc.mark_available(venue, date).await.unwrap();
        svc.mark_available(venue, date).await.unwrap();
        let record = svc.record(venue, date).await.unwrap();
        assert!(record.is_available);
        assert!(record.blackout_reason.is_none());
    }
}
