use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Refunded => "REFUNDED",
        }
    }

    /// Active bookings hold their date: at most one per (venue, date).
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "REFUNDED" => Ok(BookingStatus::Refunded),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    BookingRescheduled,
    BookingCompleted,
    BookingRefunded,
    BookingDeleted,
}

/// One line of a booking's append-only history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

/// Price as computed when the booking was made (or last rescheduled).
/// Amounts are in minor units (cents).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingSnapshot {
    pub base_price_cents: i64,
    pub seasonal_multiplier: f64,
    pub weekend_multiplier: f64,
    pub total_amount_cents: i64,
    pub guest_count: u32,
}

/// What a customer asks for when requesting a date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub customer_id: String,
    pub venue_id: Uuid,
    pub event_date: NaiveDate,
    pub guest_count: u32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub customer_id: String,
    pub event_date: NaiveDate,
    pub guest_count: u32,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub pricing: PricingSnapshot,
    pub booking_reference: String,
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Bumped on every successful write; stale writers are rejected on mismatch
    #[serde(default)]
    pub version: i64,
}

impl Booking {
    pub fn new(
        request: NewBooking,
        pricing: PricingSnapshot,
        booking_reference: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            venue_id: request.venue_id,
            customer_id: request.customer_id,
            event_date: request.event_date,
            guest_count: request.guest_count,
            notes: request.notes,
            status: BookingStatus::Pending,
            pricing,
            booking_reference,
            audit_trail: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            version: 0,
        }
    }

    /// Append to the audit trail (entries are never rewritten)
    pub fn record(&mut self, action: AuditAction, actor: &str, note: Option<String>, at: DateTime<Utc>) {
        self.audit_trail.push(AuditEntry {
            action,
            actor: actor.to_string(),
            timestamp: at,
            note,
        });
        self.updated_at = at;
    }

    pub fn update_status(&mut self, status: BookingStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PricingSnapshot {
        PricingSnapshot {
            base_price_cents: 10_000,
            seasonal_multiplier: 1.0,
            weekend_multiplier: 1.0,
            total_amount_cents: 500_000,
            guest_count: 50,
        }
    }

    #[test]
    fn test_status_round_trips_through_storage_form() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::Refunded,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("ARCHIVED".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"CONFIRMED\"");
        let action = serde_json::to_string(&AuditAction::BookingRescheduled).unwrap();
        assert_eq!(action, "\"BOOKING_RESCHEDULED\"");
    }

    #[test]
    fn test_only_pending_and_confirmed_are_active() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Refunded.is_terminal());
    }

    #[test]
    fn test_audit_trail_appends_in_order() {
        let now = Utc::now();
        let date = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
        let request = NewBooking {
            customer_id: "cust-1".into(),
            venue_id: Uuid::new_v4(),
            event_date: date,
            guest_count: 50,
            notes: None,
        };
        let mut booking = Booking::new(request, snapshot(), "BK-1".into(), now);
        assert_eq!(booking.version, 0);
        assert_eq!(booking.guest_count, 50);

        booking.record(AuditAction::BookingCreated, "cust-1", None, now);
        booking.record(AuditAction::BookingConfirmed, "owner-1", Some("ok".into()), now);

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.audit_trail.len(), 2);
        assert_eq!(booking.audit_trail[0].action, AuditAction::BookingCreated);
        assert_eq!(booking.audit_trail[1].actor, "owner-1");
    }
}
