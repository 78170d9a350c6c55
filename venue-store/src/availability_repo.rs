use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use venue_core::{AvailabilityRepository, RepoError};
use venue_shared::AvailabilityRecord;

pub struct PgAvailabilityRepository {
    pool: PgPool,
}

impl PgAvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AvailabilityRow {
    venue_id: Uuid,
    date: NaiveDate,
    is_available: bool,
    blackout_reason: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<AvailabilityRow> for AvailabilityRecord {
    fn from(row: AvailabilityRow) -> Self {
        AvailabilityRecord {
            venue_id: row.venue_id,
            date: row.date,
            is_available: row.is_available,
            blackout_reason: row.blackout_reason,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AvailabilityRepository for PgAvailabilityRepository {
    async fn get_record(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityRecord>, RepoError> {
        let row = sqlx::query_as::<_, AvailabilityRow>(
            "SELECT venue_id, date, is_available, blackout_reason, updated_at \
             FROM venue_availability WHERE venue_id = $1 AND date = $2",
        )
        .bind(venue_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AvailabilityRecord::from))
    }

    async fn upsert_record(&self, record: &AvailabilityRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO venue_availability (venue_id, date, is_available, blackout_reason, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (venue_id, date) DO UPDATE
            SET is_available = EXCLUDED.is_available,
                blackout_reason = EXCLUDED.blackout_reason,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(record.venue_id)
        .bind(record.date)
        .bind(record.is_available)
        .bind(&record.blackout_reason)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
