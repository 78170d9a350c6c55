use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;
use venue_catalog::{PriceBreakdown, PricingCalculator};
use venue_core::{
    AvailabilityRepository, BookingRepository, Clock, LockStore, NotificationDispatcher, VenueDirectory,
};
use venue_shared::{AuditAction, AvailabilityRecord, Booking, BookingStatus, BookingSummary, Masked, Venue};

pub use venue_shared::NewBooking;

use crate::availability::{AvailabilityService, BOOKED_REASON};
use crate::error::{BookingError, BookingResult};
use crate::mutex::{date_lock_key, KeyedMutex};
use crate::reference::generate_reference;

/// Collaborators wired into the orchestrator
pub struct OrchestratorDeps {
    pub bookings: Arc<dyn BookingRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub venues: Arc<dyn VenueDirectory>,
    pub locks: Arc<dyn LockStore>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub clock: Arc<dyn Clock>,
    pub lock_ttl: Duration,
}

/// A transition that takes a booking out of the active set and frees its date
struct Ending {
    from: &'static [BookingStatus],
    to: BookingStatus,
    action: AuditAction,
    verb: &'static str,
}

const CANCEL: Ending = Ending {
    from: &[BookingStatus::Pending, BookingStatus::Confirmed],
    to: BookingStatus::Cancelled,
    action: AuditAction::BookingCancelled,
    verb: "cancel",
};

const REFUND: Ending = Ending {
    from: &[BookingStatus::Pending, BookingStatus::Confirmed],
    to: BookingStatus::Refunded,
    action: AuditAction::BookingRefunded,
    verb: "refund",
};

const COMPLETE: Ending = Ending {
    from: &[BookingStatus::Confirmed],
    to: BookingStatus::Completed,
    action: AuditAction::BookingCompleted,
    verb: "complete",
};

/// Drives the booking state machine.
///
/// Every write to availability, and every "is this date taken" check that
/// precedes one, happens while holding the date mutex for that (venue, date).
pub struct BookingOrchestrator {
    bookings: Arc<dyn BookingRepository>,
    availability: AvailabilityService,
    venues: Arc<dyn VenueDirectory>,
    mutex: KeyedMutex,
    pricing: PricingCalculator,
    notifier: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    lock_ttl: Duration,
}

impl BookingOrchestrator {
    pub fn new(deps: OrchestratorDeps) -> Self {
        Self {
            bookings: deps.bookings,
            availability: AvailabilityService::new(deps.availability, deps.clock.clone()),
            venues: deps.venues,
            mutex: KeyedMutex::new(deps.locks),
            pricing: PricingCalculator::new(),
            notifier: deps.notifier,
            clock: deps.clock,
            lock_ttl: deps.lock_ttl,
        }
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub async fn create_booking(&self, request: NewBooking) -> BookingResult<Booking> {
        self.ensure_future(request.event_date)?;
        if request.guest_count == 0 {
            return Err(BookingError::Validation("Guest count must be at least 1".to_string()));
        }

        let key = date_lock_key(request.venue_id, request.event_date);
        self.mutex
            .with_lock(&key, self.lock_ttl, || self.create_locked(&request))
            .await
    }

    async fn create_locked(&self, request: &NewBooking) -> BookingResult<Booking> {
        let venue = self.load_venue(request.venue_id).await?;
        if request.guest_count > venue.capacity {
            return Err(BookingError::Validation(format!(
                "Guest count {} exceeds venue capacity {}",
                request.guest_count, venue.capacity
            )));
        }
        self.ensure_date_free(venue.id, request.event_date).await?;

        let price = self.price(&venue, request.event_date, request.guest_count);
        let now = self.clock.now();
        let mut booking = Booking::new(request.clone(), price.snapshot(), generate_reference(now), now);
        booking.record(AuditAction::BookingCreated, &request.customer_id, None, now);

        self.availability
            .mark_unavailable(venue.id, request.event_date, BOOKED_REASON)
            .await?;
        if let Err(e) = self.bookings.insert_booking(&booking).await {
            self.restore_availability(venue.id, request.event_date, true).await;
            return Err(e.into());
        }

        info!(
            "Booking {} created for {} at venue {} on {} ({} cents)",
            booking.booking_reference,
            Masked(&booking.customer_id),
            venue.id,
            booking.event_date,
            booking.pricing.total_amount_cents
        );
        self.notifier.enqueue_booking_confirmation(BookingSummary::from(&booking));

        Ok(booking)
    }

    // ------------------------------------------------------------------
    // Status transitions
    // ------------------------------------------------------------------

    /// PENDING -> CONFIRMED. The date is already held, so no lock is taken;
    /// the version guard rejects the write if anything else touched the
    /// booking (cancel, reschedule) since it was read.
    pub async fn confirm_booking(&self, booking_id: Uuid, actor_id: &str) -> BookingResult<Booking> {
        let mut booking = self.load_booking(booking_id).await?;
        if booking.status != BookingStatus::Pending {
            return Err(BookingError::InvalidTransition {
                status: booking.status,
                action: "confirm",
            });
        }

        let now = self.clock.now();
        booking.update_status(BookingStatus::Confirmed, now);
        booking.record(AuditAction::BookingConfirmed, actor_id, None, now);
        self.save(&mut booking).await?;

        info!("Booking {} confirmed by {}", booking.booking_reference, actor_id);
        Ok(booking)
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        actor_id: &str,
        reason: Option<String>,
    ) -> BookingResult<Booking> {
        self.end_booking(booking_id, actor_id, reason, &CANCEL).await
    }

    pub async fn refund_booking(
        &self,
        booking_id: Uuid,
        actor_id: &str,
        reason: Option<String>,
    ) -> BookingResult<Booking> {
        self.end_booking(booking_id, actor_id, reason, &REFUND).await
    }

    /// CONFIRMED -> COMPLETED, once the event date has arrived
    pub async fn complete_booking(&self, booking_id: Uuid, actor_id: &str) -> BookingResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        if booking.status == BookingStatus::Confirmed && booking.event_date > self.clock.today() {
            return Err(BookingError::Validation(format!(
                "Booking {} cannot be completed before its event date {}",
                booking.booking_reference, booking.event_date
            )));
        }
        self.end_booking(booking_id, actor_id, None, &COMPLETE).await
    }

    async fn end_booking(
        &self,
        booking_id: Uuid,
        actor_id: &str,
        reason: Option<String>,
        ending: &Ending,
    ) -> BookingResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        if !ending.from.contains(&booking.status) {
            return Err(BookingError::InvalidTransition {
                status: booking.status,
                action: ending.verb,
            });
        }

        let key = date_lock_key(booking.venue_id, booking.event_date);
        self.mutex
            .with_lock(&key, self.lock_ttl, || {
                self.end_booking_locked(booking_id, booking.event_date, actor_id, reason, ending)
            })
            .await
    }

    async fn end_booking_locked(
        &self,
        booking_id: Uuid,
        locked_date: NaiveDate,
        actor_id: &str,
        reason: Option<String>,
        ending: &Ending,
    ) -> BookingResult<Booking> {
        // Re-read under the lock: a reschedule may have moved the booking
        let mut booking = self.load_booking(booking_id).await?;
        if booking.event_date != locked_date {
            return Err(BookingError::Conflict(format!(
                "Booking {} was rescheduled concurrently",
                booking.booking_reference
            )));
        }
        if !ending.from.contains(&booking.status) {
            return Err(BookingError::InvalidTransition {
                status: booking.status,
                action: ending.verb,
            });
        }

        let previous = booking.status;
        self.availability.mark_available(booking.venue_id, booking.event_date).await?;

        let now = self.clock.now();
        booking.update_status(ending.to, now);
        booking.record(ending.action, actor_id, reason, now);
        if let Err(e) = self.save(&mut booking).await {
            self.restore_availability(booking.venue_id, booking.event_date, false).await;
            return Err(e);
        }

        info!(
            "Booking {} moved {} -> {} by {}",
            booking.booking_reference, previous, booking.status, actor_id
        );
        Ok(booking)
    }

    // ------------------------------------------------------------------
    // Reschedule
    // ------------------------------------------------------------------

    /// Moves an active booking to `new_date`, keeping its id and status.
    /// Either both dates flip together with the booking or nothing changes.
    pub async fn reschedule_booking(
        &self,
        booking_id: Uuid,
        actor_id: &str,
        new_date: NaiveDate,
        reason: Option<String>,
    ) -> BookingResult<Booking> {
        self.ensure_future(new_date)?;

        let booking = self.load_booking(booking_id).await?;
        if !booking.status.is_active() {
            return Err(BookingError::InvalidTransition {
                status: booking.status,
                action: "reschedule",
            });
        }
        if booking.event_date == new_date {
            return Err(BookingError::Validation(format!(
                "Booking {} is already scheduled on {}",
                booking.booking_reference, new_date
            )));
        }

        let old_date = booking.event_date;
        let keys = [
            date_lock_key(booking.venue_id, old_date),
            date_lock_key(booking.venue_id, new_date),
        ];
        self.mutex
            .with_locks(&keys, self.lock_ttl, || {
                self.reschedule_locked(booking_id, old_date, new_date, actor_id, reason)
            })
            .await
    }

    async fn reschedule_locked(
        &self,
        booking_id: Uuid,
        old_date: NaiveDate,
        new_date: NaiveDate,
        actor_id: &str,
        reason: Option<String>,
    ) -> BookingResult<Booking> {
        let mut booking = self.load_booking(booking_id).await?;
        if booking.event_date != old_date {
            return Err(BookingError::Conflict(format!(
                "Booking {} was rescheduled concurrently",
                booking.booking_reference
            )));
        }
        if !booking.status.is_active() {
            return Err(BookingError::InvalidTransition {
                status: booking.status,
                action: "reschedule",
            });
        }

        let venue = self.load_venue(booking.venue_id).await?;
        self.ensure_date_free(venue.id, new_date).await?;
        let price = self.price(&venue, new_date, booking.guest_count);

        self.availability
            .mark_unavailable(venue.id, new_date, BOOKED_REASON)
            .await?;
        if let Err(e) = self.availability.mark_available(venue.id, old_date).await {
            self.restore_availability(venue.id, new_date, true).await;
            return Err(e.into());
        }

        let now = self.clock.now();
        booking.event_date = new_date;
        booking.pricing = price.snapshot();
        let note = match reason {
            Some(reason) => format!("{} -> {}: {}", old_date, new_date, reason),
            None => format!("{} -> {}", old_date, new_date),
        };
        booking.record(AuditAction::BookingRescheduled, actor_id, Some(note), now);

        if let Err(e) = self.save(&mut booking).await {
            self.restore_availability(venue.id, old_date, false).await;
            self.restore_availability(venue.id, new_date, true).await;
            return Err(e);
        }

        info!(
            "Booking {} rescheduled {} -> {} by {}",
            booking.booking_reference, old_date, new_date, actor_id
        );
        Ok(booking)
    }

    // ------------------------------------------------------------------
    // Blackouts
    // ------------------------------------------------------------------

    /// Administratively block a date. Refused while a booking holds it.
    pub async fn block_date(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
        actor_id: &str,
        reason: &str,
    ) -> BookingResult<AvailabilityRecord> {
        self.ensure_future(date)?;
        if reason.trim().is_empty() {
            return Err(BookingError::Validation("Blackout reason must not be empty".to_string()));
        }

        let key = date_lock_key(venue_id, date);
        self.mutex
            .with_lock(&key, self.lock_ttl, || async move {
                self.load_venue(venue_id).await?;
                self.ensure_no_active_booking(venue_id, date).await?;
                self.availability.mark_unavailable(venue_id, date, reason).await?;
                info!("Venue {} blocked on {} by {}: {}", venue_id, date, actor_id, reason);
                Ok::<_, BookingError>(self.availability.record(venue_id, date).await?)
            })
            .await
    }

    pub async fn unblock_date(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
        actor_id: &str,
    ) -> BookingResult<AvailabilityRecord> {
        let key = date_lock_key(venue_id, date);
        self.mutex
            .with_lock(&key, self.lock_ttl, || async move {
                self.load_venue(venue_id).await?;
                self.ensure_no_active_booking(venue_id, date).await?;
                self.availability.mark_available(venue_id, date).await?;
                info!("Venue {} unblocked on {} by {}", venue_id, date, actor_id);
                Ok::<_, BookingError>(self.availability.record(venue_id, date).await?)
            })
            .await
    }

    pub async fn get_availability(&self, venue_id: Uuid, date: NaiveDate) -> BookingResult<AvailabilityRecord> {
        self.load_venue(venue_id).await?;
        Ok(self.availability.record(venue_id, date).await?)
    }

    // ------------------------------------------------------------------
    // Reads and housekeeping
    // ------------------------------------------------------------------

    pub async fn get_booking(&self, booking_id: Uuid) -> BookingResult<Booking> {
        self.load_booking(booking_id).await
    }

    pub async fn list_bookings_by_customer(&self, customer_id: &str) -> BookingResult<Vec<Booking>> {
        Ok(self.bookings.list_by_customer(customer_id).await?)
    }

    pub async fn list_bookings_by_venue(&self, venue_id: Uuid) -> BookingResult<Vec<Booking>> {
        self.load_venue(venue_id).await?;
        Ok(self.bookings.list_by_venue(venue_id).await?)
    }

    /// Soft-delete a finished booking
    pub async fn delete_booking(&self, booking_id: Uuid, actor_id: &str) -> BookingResult<()> {
        let mut booking = self.load_booking(booking_id).await?;
        if !booking.status.is_terminal() {
            return Err(BookingError::InvalidTransition {
                status: booking.status,
                action: "delete",
            });
        }

        let now = self.clock.now();
        booking.record(AuditAction::BookingDeleted, actor_id, None, now);
        booking.deleted_at = Some(now);
        self.save(&mut booking).await?;

        info!("Booking {} deleted by {}", booking.booking_reference, actor_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn ensure_future(&self, date: NaiveDate) -> BookingResult<()> {
        if date <= self.clock.today() {
            return Err(BookingError::Validation(format!("Event date {} must be in the future", date)));
        }
        Ok(())
    }

    /// Blackouts and bookings are independent sources of conflict; both must agree the date is free
    async fn ensure_date_free(&self, venue_id: Uuid, date: NaiveDate) -> BookingResult<()> {
        if !self.availability.is_available(venue_id, date).await? {
            return Err(BookingError::Conflict(format!("Date {} is no longer available", date)));
        }
        self.ensure_no_active_booking(venue_id, date).await
    }

    async fn ensure_no_active_booking(&self, venue_id: Uuid, date: NaiveDate) -> BookingResult<()> {
        if let Some(existing) = self.bookings.find_active_booking(venue_id, date).await? {
            return Err(BookingError::Conflict(format!(
                "Date {} is already booked ({})",
                date, existing.booking_reference
            )));
        }
        Ok(())
    }

    async fn load_booking(&self, booking_id: Uuid) -> BookingResult<Booking> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Booking {}", booking_id)))
    }

    async fn load_venue(&self, venue_id: Uuid) -> BookingResult<Venue> {
        self.venues
            .get_venue(venue_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Venue {}", venue_id)))
    }

    /// Write back a booking read earlier, bumping its version. Fails with a
    /// conflict when the stored version moved on in the meantime.
    async fn save(&self, booking: &mut Booking) -> BookingResult<()> {
        let expected = booking.version;
        booking.version += 1;
        if !self.bookings.update_booking(booking, expected).await? {
            return Err(BookingError::Conflict(format!(
                "Booking {} was modified concurrently",
                booking.booking_reference
            )));
        }
        Ok(())
    }

    fn price(&self, venue: &Venue, date: NaiveDate, guest_count: u32) -> PriceBreakdown {
        let overlaps = self.pricing.overlapping_windows(&venue.pricing);
        if !overlaps.is_empty() {
            warn!("Venue {} has overlapping seasonal windows {:?}; first match wins", venue.id, overlaps);
        }
        self.pricing.calculate(&venue.pricing, date, guest_count)
    }

    /// Best-effort undo of an availability write when a later step fails.
    /// The original error is what the caller sees.
    async fn restore_availability(&self, venue_id: Uuid, date: NaiveDate, available: bool) {
        let result = if available {
            self.availability.mark_available(venue_id, date).await
        } else {
            self.availability.mark_unavailable(venue_id, date, BOOKED_REASON).await
        };
        if let Err(e) = result {
            error!("Failed to restore availability for {} on {}: {}", venue_id, date, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use venue_core::FixedClock;
    use venue_shared::{PricingConfig, SeasonalRate};
    use venue_store::{MemoryAvailabilityRepository, MemoryBookingRepository, MemoryLockStore, MemoryVenueDirectory};

    #[derive(Default)]
    struct Captured(Mutex<Vec<BookingSummary>>);

    impl NotificationDispatcher for Captured {
        fn enqueue_booking_confirmation(&self, summary: BookingSummary) {
            self.0.lock().unwrap().push(summary);
        }
    }

    struct Harness {
        orchestrator: BookingOrchestrator,
        availability: Arc<MemoryAvailabilityRepository>,
        locks: Arc<MemoryLockStore>,
        notifications: Arc<Captured>,
        clock: Arc<FixedClock>,
        venue: Venue,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn harness() -> Harness {
        let venue = Venue {
            id: Uuid::new_v4(),
            name: "Harbour Hall".into(),
            capacity: 500,
            pricing: PricingConfig {
                base_price_cents: 1_000,
                seasonal_rates: vec![SeasonalRate {
                    name: "Summer".into(),
                    start_date: date(2026, 6, 1),
                    end_date: date(2026, 8, 31),
                    multiplier: 1.5,
                }],
                weekend_multiplier: Some(1.2),
            },
        };
        let venues = Arc::new(MemoryVenueDirectory::new());
        venues.insert(venue.clone()).await;

        let availability = Arc::new(MemoryAvailabilityRepository::new());
        let locks = Arc::new(MemoryLockStore::new());
        let notifications = Arc::new(Captured::default());
        let clock = Arc::new(FixedClock::at_date(date(2026, 1, 1)));

        let orchestrator = BookingOrchestrator::new(OrchestratorDeps {
            bookings: Arc::new(MemoryBookingRepository::new()),
            availability: availability.clone(),
            venues,
            locks: locks.clone(),
            notifier: notifications.clone(),
            clock: clock.clone(),
            lock_ttl: Duration::from_secs(10),
        });

        Harness { orchestrator, availability, locks, notifications, clock, venue }
    }

    fn request(h: &Harness, customer: &str, event_date: NaiveDate, guests: u32) -> NewBooking {
        NewBooking {
            customer_id: customer.into(),
            venue_id: h.venue.id,
            event_date,
            guest_count: guests,
            notes: None,
        }
    }

    async fn is_available(h: &Harness, d: NaiveDate) -> bool {
        AvailabilityService::new(h.availability.clone(), h.clock.clone())
            .is_available(h.venue.id, d)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_prices_and_reserves_date() {
        let h = harness().await;
        // Saturday inside the summer window
        let d = date(2026, 7, 4);
        let booking = h.orchestrator.create_booking(request(&h, "cust-1", d, 100)).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.pricing.total_amount_cents, 180_000);
        assert_eq!(booking.audit_trail.len(), 1);
        assert_eq!(booking.audit_trail[0].action, AuditAction::BookingCreated);
        assert_eq!(booking.audit_trail[0].actor, "cust-1");
        assert!(!is_available(&h, d).await);
        assert!(h.locks.holder(&date_lock_key(h.venue.id, d)).await.is_none());

        let sent = h.notifications.0.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].booking_id, booking.id);
    }

    #[tokio::test]
    async fn test_create_rejects_past_and_today() {
        let h = harness().await;
        for d in [date(2025, 12, 31), date(2026, 1, 1)] {
            let err = h.orchestrator.create_booking(request(&h, "c", d, 10)).await.unwrap_err();
            assert!(matches!(err, BookingError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_create_rejects_zero_guests_and_unknown_venue() {
        let h = harness().await;
        let d = date(2026, 3, 3);
        let err = h.orchestrator.create_booking(request(&h, "c", d, 0)).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let mut unknown = request(&h, "c", d, 10);
        unknown.venue_id = Uuid::new_v4();
        let err = h.orchestrator.create_booking(unknown).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_conflicts_while_date_lock_is_held() {
        let h = harness().await;
        let d = date(2026, 3, 3);
        let mutex = KeyedMutex::new(h.locks.clone());
        let _token = mutex.acquire(&date_lock_key(h.venue.id, d), Duration::from_secs(10)).await.unwrap();

        let err = h.orchestrator.create_booking(request(&h, "c", d, 10)).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(msg) if msg.contains("being reserved")));
        assert!(is_available(&h, d).await);
    }

    #[tokio::test]
    async fn test_blackout_blocks_create() {
        let h = harness().await;
        let d = date(2026, 3, 3);
        h.orchestrator.block_date(h.venue.id, d, "owner-1", "Maintenance").await.unwrap();

        let err = h.orchestrator.create_booking(request(&h, "c", d, 10)).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));

        let record = h.orchestrator.unblock_date(h.venue.id, d, "owner-1").await.unwrap();
        assert!(record.is_available);
        assert!(h.orchestrator.create_booking(request(&h, "c", d, 10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_block_and_unblock_refuse_booked_date() {
        let h = harness().await;
        let d = date(2026, 3, 3);
        h.orchestrator.create_booking(request(&h, "c", d, 10)).await.unwrap();

        let err = h.orchestrator.block_date(h.venue.id, d, "owner-1", "Private").await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
        let err = h.orchestrator.unblock_date(h.venue.id, d, "owner-1").await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
        assert!(!is_available(&h, d).await);
    }

    #[tokio::test]
    async fn test_confirm_then_cancel_frees_date() {
        let h = harness().await;
        let d = date(2026, 3, 3);
        let booking = h.orchestrator.create_booking(request(&h, "c", d, 10)).await.unwrap();

        assert_eq!(booking.version, 0);
        let confirmed = h.orchestrator.confirm_booking(booking.id, "owner-1").await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.version, 1);

        let err = h.orchestrator.confirm_booking(booking.id, "owner-1").await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { status: BookingStatus::Confirmed, .. }));

        let cancelled = h
            .orchestrator
            .cancel_booking(booking.id, "owner-1", Some("Client request".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.version, 2);
        assert_eq!(cancelled.audit_trail.last().unwrap().note.as_deref(), Some("Client request"));
        assert!(is_available(&h, d).await);

        let err = h.orchestrator.cancel_booking(booking.id, "owner-1", None).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { action: "cancel", .. }));
    }

    #[tokio::test]
    async fn test_refund_frees_date() {
        let h = harness().await;
        let d = date(2026, 3, 3);
        let booking = h.orchestrator.create_booking(request(&h, "c", d, 10)).await.unwrap();

        let refunded = h.orchestrator.refund_booking(booking.id, "admin-1", None).await.unwrap();
        assert_eq!(refunded.status, BookingStatus::Refunded);
        assert_eq!(refunded.audit_trail.last().unwrap().action, AuditAction::BookingRefunded);
        assert!(is_available(&h, d).await);
    }

    #[tokio::test]
    async fn test_complete_waits_for_event_date() {
        let h = harness().await;
        let d = date(2026, 3, 3);
        let booking = h.orchestrator.create_booking(request(&h, "c", d, 10)).await.unwrap();

        let err = h.orchestrator.complete_booking(booking.id, "owner-1").await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { status: BookingStatus::Pending, .. }));

        h.orchestrator.confirm_booking(booking.id, "owner-1").await.unwrap();
        let err = h.orchestrator.complete_booking(booking.id, "owner-1").await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        h.clock.set(d.and_hms_opt(18, 0, 0).unwrap().and_utc());
        let completed = h.orchestrator.complete_booking(booking.id, "owner-1").await.unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn test_reschedule_moves_date_and_reprices() {
        let h = harness().await;
        let old = date(2026, 3, 3); // Tuesday
        let new = date(2026, 7, 4); // Saturday in summer
        let booking = h.orchestrator.create_booking(request(&h, "c", old, 100)).await.unwrap();
        assert_eq!(booking.pricing.total_amount_cents, 100_000);

        let moved = h
            .orchestrator
            .reschedule_booking(booking.id, "c", new, Some("Weather".into()))
            .await
            .unwrap();

        assert_eq!(moved.id, booking.id);
        assert_eq!(moved.status, BookingStatus::Pending);
        assert_eq!(moved.event_date, new);
        assert_eq!(moved.pricing.total_amount_cents, 180_000);
        assert_eq!(
            moved.audit_trail.last().unwrap().note.as_deref(),
            Some("2026-03-03 -> 2026-07-04: Weather")
        );
        assert!(is_available(&h, old).await);
        assert!(!is_available(&h, new).await);
    }

    #[tokio::test]
    async fn test_reschedule_onto_booked_date_changes_nothing() {
        let h = harness().await;
        let x = date(2026, 3, 3);
        let y = date(2026, 3, 4);
        let first = h.orchestrator.create_booking(request(&h, "a", x, 10)).await.unwrap();
        h.orchestrator.create_booking(request(&h, "b", y, 10)).await.unwrap();

        let err = h.orchestrator.reschedule_booking(first.id, "a", y, None).await.unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));

        let reloaded = h.orchestrator.get_booking(first.id).await.unwrap();
        assert_eq!(reloaded.event_date, x);
        assert_eq!(reloaded.audit_trail.len(), 1);
        assert!(!is_available(&h, x).await);
        assert!(!is_available(&h, y).await);
    }

    #[tokio::test]
    async fn test_reschedule_rejects_same_date_and_terminal() {
        let h = harness().await;
        let d = date(2026, 3, 3);
        let booking = h.orchestrator.create_booking(request(&h, "c", d, 10)).await.unwrap();

        let err = h.orchestrator.reschedule_booking(booking.id, "c", d, None).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        h.orchestrator.cancel_booking(booking.id, "c", None).await.unwrap();
        let err = h
            .orchestrator
            .reschedule_booking(booking.id, "c", date(2026, 4, 4), None)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { action: "reschedule", .. }));
    }

    #[tokio::test]
    async fn test_delete_only_terminal_and_hides_booking() {
        let h = harness().await;
        let booking = h.orchestrator.create_booking(request(&h, "c", date(2026, 3, 3), 10)).await.unwrap();

        let err = h.orchestrator.delete_booking(booking.id, "admin-1").await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { action: "delete", .. }));

        h.orchestrator.cancel_booking(booking.id, "c", None).await.unwrap();
        h.orchestrator.delete_booking(booking.id, "admin-1").await.unwrap();

        let err = h.orchestrator.get_booking(booking.id).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
        assert!(h.orchestrator.list_bookings_by_customer("c").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lists_by_customer_and_venue() {
        let h = harness().await;
        h.orchestrator.create_booking(request(&h, "a", date(2026, 3, 4), 10)).await.unwrap();
        h.orchestrator.create_booking(request(&h, "a", date(2026, 3, 3), 10)).await.unwrap();
        h.orchestrator.create_booking(request(&h, "b", date(2026, 3, 5), 10)).await.unwrap();

        let mine = h.orchestrator.list_bookings_by_customer("a").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].event_date, date(2026, 3, 3));

        assert_eq!(h.orchestrator.list_bookings_by_venue(h.venue.id).await.unwrap().len(), 3);
        let err = h.orchestrator.list_bookings_by_venue(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_offline_lock_store_is_unavailable() {
        let h = harness().await;
        h.locks.set_offline(true);
        let err = h
            .orchestrator
            .create_booking(request(&h, "c", date(2026, 3, 3), 10))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::LockUnavailable(_)));
        assert!(h.notifications.0.lock().unwrap().is_empty());
    }
}
