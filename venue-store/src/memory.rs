//! In-process backends for single-instance deployments and tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;
use venue_core::{
    AvailabilityRepository, BookingRepository, LockStore, LockStoreError, NotificationSink, RepoError,
    VenueDirectory,
};
use venue_shared::{AvailabilityRecord, Booking, BookingSummary, Venue};

/// TTL map standing in for Redis. `set_offline` simulates an unreachable store.
#[derive(Default)]
pub struct MemoryLockStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    offline: AtomicBool,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), LockStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LockStoreError("memory lock store is offline".to_string()));
        }
        Ok(())
    }

    /// Live (unexpired) holder of `key`
    pub async fn holder(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(token, _)| token.clone())
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, LockStoreError> {
        self.check_online()?;
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        if let Some((_, expires_at)) = entries.get(key) {
            if *expires_at > now {
                return Ok(false);
            }
        }

        entries.insert(key.to_string(), (token.to_string(), now + ttl));
        Ok(true)
    }

    async fn delete_if_owned(&self, key: &str, token: &str) -> Result<bool, LockStoreError> {
        self.check_online()?;
        let mut entries = self.entries.lock().await;
        let owned = entries
            .get(key)
            .map(|(stored, expires_at)| stored == token && *expires_at > Instant::now())
            .unwrap_or(false);

        if owned {
            entries.remove(key);
        }
        Ok(owned)
    }
}

/// Mirrors the Postgres partial unique index: inserting a second active
/// booking for the same venue and date fails.
#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored booking, including soft-deleted ones
    pub async fn all(&self) -> Vec<Booking> {
        self.bookings.read().await.values().cloned().collect()
    }
}

fn visible_sorted<'a>(bookings: impl Iterator<Item = &'a Booking>) -> Vec<Booking> {
    let mut found: Vec<Booking> = bookings.filter(|b| !b.is_deleted()).cloned().collect();
    found.sort_by_key(|b| (b.event_date, b.created_at));
    found
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), RepoError> {
        let mut bookings = self.bookings.write().await;

        if booking.status.is_active() {
            let clash = bookings.values().any(|b| {
                !b.is_deleted()
                    && b.status.is_active()
                    && b.venue_id == booking.venue_id
                    && b.event_date == booking.event_date
            });
            if clash {
                return Err(format!(
                    "duplicate active booking for venue {} on {}",
                    booking.venue_id, booking.event_date
                )
                .into());
            }
        }
        if bookings.contains_key(&booking.id) {
            return Err(format!("booking {} already exists", booking.id).into());
        }

        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id).filter(|b| !b.is_deleted()).cloned())
    }

    async fn update_booking(&self, booking: &Booking, expected_version: i64) -> Result<bool, RepoError> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&booking.id) {
            Some(stored) if !stored.is_deleted() && stored.version == expected_version => {
                *stored = booking.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_active_booking(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Booking>, RepoError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .find(|b| !b.is_deleted() && b.status.is_active() && b.venue_id == venue_id && b.event_date == date)
            .cloned())
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Booking>, RepoError> {
        let bookings = self.bookings.read().await;
        Ok(visible_sorted(bookings.values().filter(|b| b.customer_id == customer_id)))
    }

    async fn list_by_venue(&self, venue_id: Uuid) -> Result<Vec<Booking>, RepoError> {
        let bookings = self.bookings.read().await;
        Ok(visible_sorted(bookings.values().filter(|b| b.venue_id == venue_id)))
    }
}

#[derive(Default)]
pub struct MemoryAvailabilityRepository {
    records: RwLock<HashMap<(Uuid, NaiveDate), AvailabilityRecord>>,
}

impl MemoryAvailabilityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryAvailabilityRepository {
    async fn get_record(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityRecord>, RepoError> {
        Ok(self.records.read().await.get(&(venue_id, date)).cloned())
    }

    async fn upsert_record(&self, record: &AvailabilityRecord) -> Result<(), RepoError> {
        self.records
            .write()
            .await
            .insert((record.venue_id, record.date), record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryVenueDirectory {
    venues: RwLock<HashMap<Uuid, Venue>>,
}

impl MemoryVenueDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, venue: Venue) {
        self.venues.write().await.insert(venue.id, venue);
    }
}

#[async_trait]
impl VenueDirectory for MemoryVenueDirectory {
    async fn get_venue(&self, venue_id: Uuid) -> Result<Option<Venue>, RepoError> {
        Ok(self.venues.read().await.get(&venue_id).cloned())
    }
}

/// Logs and keeps every delivered notification. Used when Kafka is disabled.
#[derive(Default)]
pub struct MemoryNotificationSink {
    delivered: Mutex<Vec<BookingSummary>>,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn delivered(&self) -> Vec<BookingSummary> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotificationSink {
    async fn deliver(&self, summary: &BookingSummary) -> Result<(), RepoError> {
        info!(
            "Booking confirmation {} for {} on {}",
            summary.booking_reference, summary.venue_id, summary.event_date
        );
        self.delivered.lock().await.push(summary.clone());
        Ok(())
    }
}
