pub mod models;
pub mod pii;

pub use models::availability::AvailabilityRecord;
pub use models::booking::{AuditAction, AuditEntry, Booking, BookingStatus, NewBooking, PricingSnapshot};
pub use models::events::BookingSummary;
pub use models::venue::{PricingConfig, SeasonalRate, Venue};
pub use pii::Masked;
