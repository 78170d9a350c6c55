use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus};

/// Payload handed to the notification pipeline after a booking is reserved
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingSummary {
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub venue_id: Uuid,
    pub customer_id: String,
    pub event_date: NaiveDate,
    pub guest_count: u32,
    pub total_amount_cents: i64,
    pub status: BookingStatus,
    pub timestamp: i64,
}

impl From<&Booking> for BookingSummary {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id,
            booking_reference: booking.booking_reference.clone(),
            venue_id: booking.venue_id,
            customer_id: booking.customer_id.clone(),
            event_date: booking.event_date,
            guest_count: booking.guest_count,
            total_amount_cents: booking.pricing.total_amount_cents,
            status: booking.status,
            timestamp: booking.updated_at.timestamp(),
        }
    }
}
