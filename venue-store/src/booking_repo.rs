use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use venue_core::{BookingRepository, RepoError};
use venue_shared::{AuditEntry, Booking, BookingStatus, PricingSnapshot};

const BOOKING_COLUMNS: &str = "id, venue_id, customer_id, event_date, guest_count, notes, status, pricing, \
     booking_reference, audit_trail, created_at, updated_at, deleted_at, version";

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    venue_id: Uuid,
    customer_id: String,
    event_date: NaiveDate,
    guest_count: i32,
    notes: Option<String>,
    status: String,
    pricing: Json<PricingSnapshot>,
    booking_reference: String,
    audit_trail: Json<Vec<AuditEntry>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    version: i64,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepoError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            venue_id: row.venue_id,
            customer_id: row.customer_id,
            event_date: row.event_date,
            guest_count: u32::try_from(row.guest_count)?,
            notes: row.notes,
            status: row.status.parse::<BookingStatus>()?,
            pricing: row.pricing.0,
            booking_reference: row.booking_reference,
            audit_trail: row.audit_trail.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            version: row.version,
        })
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, RepoError> {
    rows.into_iter().map(Booking::try_from).collect()
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, venue_id, customer_id, event_date, guest_count, notes, status, pricing,
                                  booking_reference, audit_trail, created_at, updated_at, deleted_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(booking.id)
        .bind(booking.venue_id)
        .bind(&booking.customer_id)
        .bind(booking.event_date)
        .bind(i32::try_from(booking.guest_count)?)
        .bind(&booking.notes)
        .bind(booking.status.as_str())
        .bind(Json(&booking.pricing))
        .bind(&booking.booking_reference)
        .bind(Json(&booking.audit_trail))
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.deleted_at)
        .bind(booking.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1 AND deleted_at IS NULL", BOOKING_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn update_booking(&self, booking: &Booking, expected_version: i64) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET event_date = $2, guest_count = $3, notes = $4, status = $5, pricing = $6,
                audit_trail = $7, updated_at = $8, deleted_at = $9, version = $11
            WHERE id = $1 AND version = $10 AND deleted_at IS NULL
            "#,
        )
        .bind(booking.id)
        .bind(booking.event_date)
        .bind(i32::try_from(booking.guest_count)?)
        .bind(&booking.notes)
        .bind(booking.status.as_str())
        .bind(Json(&booking.pricing))
        .bind(Json(&booking.audit_trail))
        .bind(booking.updated_at)
        .bind(booking.deleted_at)
        .bind(expected_version)
        .bind(booking.version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_active_booking(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Booking>, RepoError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE venue_id = $1 AND event_date = $2 \
             AND status IN ('PENDING', 'CONFIRMED') AND deleted_at IS NULL LIMIT 1",
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(venue_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Booking>, RepoError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE customer_id = $1 AND deleted_at IS NULL ORDER BY event_date",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        into_bookings(rows)
    }

    async fn list_by_venue(&self, venue_id: Uuid) -> Result<Vec<Booking>, RepoError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE venue_id = $1 AND deleted_at IS NULL ORDER BY event_date",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(venue_id)
            .fetch_all(&self.pool)
            .await?;

        into_bookings(rows)
    }
}
