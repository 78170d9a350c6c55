use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use venue_shared::AvailabilityRecord;

use crate::actor::Caller;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BlockDateRequest {
    pub reason: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/venues/{venue_id}/availability/{date}",
        get(get_availability).put(block_date).delete(unblock_date),
    )
}

/// GET /v1/venues/{venue_id}/availability/{date}
async fn get_availability(
    State(state): State<AppState>,
    Path((venue_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<AvailabilityRecord>, AppError> {
    Ok(Json(state.orchestrator.get_availability(venue_id, date).await?))
}

/// PUT /v1/venues/{venue_id}/availability/{date}
/// Blackout a date for the given reason
async fn block_date(
    State(state): State<AppState>,
    caller: Caller,
    Path((venue_id, date)): Path<(Uuid, NaiveDate)>,
    Json(req): Json<BlockDateRequest>,
) -> Result<Json<AvailabilityRecord>, AppError> {
    caller.require_staff()?;
    let record = state
        .orchestrator
        .block_date(venue_id, date, caller.id(), &req.reason)
        .await?;
    Ok(Json(record))
}

/// DELETE /v1/venues/{venue_id}/availability/{date}
async fn unblock_date(
    State(state): State<AppState>,
    caller: Caller,
    Path((venue_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<AvailabilityRecord>, AppError> {
    caller.require_staff()?;
    Ok(Json(state.orchestrator.unblock_date(venue_id, date, caller.id()).await?))
}
