use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bookable/blocked state of one venue on one date.
/// Records are upserted and never deleted; a missing record reads as available.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityRecord {
    pub venue_id: Uuid,
    pub date: NaiveDate,
    pub is_available: bool,
    pub blackout_reason: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AvailabilityRecord {
    /// The implicit record for a date nobody has written yet
    pub fn open(venue_id: Uuid, date: NaiveDate) -> Self {
        Self {
            venue_id,
            date,
            is_available: true,
            blackout_reason: None,
            updated_at: None,
        }
    }
}
