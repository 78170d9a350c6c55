use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use venue_core::{RepoError, VenueDirectory};
use venue_shared::{PricingConfig, Venue};

/// Read side of the venues table. Venue CRUD lives in another service;
/// this crate only reads capacity and pricing.
pub struct PgVenueDirectory {
    pool: PgPool,
}

impl PgVenueDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct VenueRow {
    id: Uuid,
    name: String,
    capacity: i32,
    pricing: Json<PricingConfig>,
}

#[async_trait]
impl VenueDirectory for PgVenueDirectory {
    async fn get_venue(&self, venue_id: Uuid) -> Result<Option<Venue>, RepoError> {
        let row = sqlx::query_as::<_, VenueRow>("SELECT id, name, capacity, pricing FROM venues WHERE id = $1")
            .bind(venue_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Venue {
                id: row.id,
                name: row.name,
                capacity: u32::try_from(row.capacity)?,
                pricing: row.pricing.0,
            })),
            None => Ok(None),
        }
    }
}
