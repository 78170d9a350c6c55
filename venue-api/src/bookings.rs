use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use venue_booking::NewBooking;
use venue_shared::{AuditEntry, Booking, BookingStatus, PricingSnapshot};

use crate::actor::Caller;
use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub venue_id: Uuid,
    pub event_date: NaiveDate,
    pub guest_count: u32,
    pub notes: Option<String>,
    /// Staff may book on behalf of a customer; ignored for customers
    pub customer_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub new_event_date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_reference: String,
    pub venue_id: Uuid,
    pub customer_id: String,
    pub event_date: NaiveDate,
    pub guest_count: u32,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub pricing: PricingSnapshot,
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            booking_reference: b.booking_reference,
            venue_id: b.venue_id,
            customer_id: b.customer_id,
            event_date: b.event_date,
            guest_count: b.guest_count,
            notes: b.notes,
            status: b.status,
            pricing: b.pricing,
            audit_trail: b.audit_trail,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

fn list_response(bookings: Vec<Booking>) -> Json<Vec<BookingResponse>> {
    Json(bookings.into_iter().map(BookingResponse::from).collect())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking).delete(delete_booking))
        .route("/v1/bookings/{id}/confirm", post(confirm_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/refund", post(refund_booking))
        .route("/v1/bookings/{id}/complete", post(complete_booking))
        .route("/v1/bookings/{id}/reschedule", post(reschedule_booking))
        .route("/v1/customers/{customer_id}/bookings", get(list_customer_bookings))
        .route("/v1/venues/{venue_id}/bookings", get(list_venue_bookings))
}

/// Loads the booking and checks the caller may act on it
async fn owned_booking(state: &AppState, caller: &Caller, booking_id: Uuid) -> Result<Booking, AppError> {
    let booking = state.orchestrator.get_booking(booking_id).await?;
    caller.require_self_or_staff(&booking.customer_id)?;
    Ok(booking)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let customer_id = match req.customer_id {
        Some(customer_id) if caller.0.is_staff() => customer_id,
        _ => caller.id().to_string(),
    };

    let booking = state
        .orchestrator
        .create_booking(NewBooking {
            customer_id,
            venue_id: req.venue_id,
            event_date: req.event_date,
            guest_count: req.guest_count,
            notes: req.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /v1/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = owned_booking(&state, &caller, booking_id).await?;
    Ok(Json(booking.into()))
}

/// POST /v1/bookings/{id}/confirm
async fn confirm_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    caller.require_staff()?;
    let booking = state.orchestrator.confirm_booking(booking_id, caller.id()).await?;
    Ok(Json(booking.into()))
}

/// POST /v1/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(booking_id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> Result<Json<BookingResponse>, AppError> {
    owned_booking(&state, &caller, booking_id).await?;
    let reason = body.and_then(|Json(b)| b.reason);
    let booking = state.orchestrator.cancel_booking(booking_id, caller.id(), reason).await?;
    Ok(Json(booking.into()))
}

/// POST /v1/bookings/{id}/refund
async fn refund_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(booking_id): Path<Uuid>,
    body: Option<Json<ReasonRequest>>,
) -> Result<Json<BookingResponse>, AppError> {
    caller.require_staff()?;
    let reason = body.and_then(|Json(b)| b.reason);
    let booking = state.orchestrator.refund_booking(booking_id, caller.id(), reason).await?;
    Ok(Json(booking.into()))
}

/// POST /v1/bookings/{id}/complete
async fn complete_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    caller.require_staff()?;
    let booking = state.orchestrator.complete_booking(booking_id, caller.id()).await?;
    Ok(Json(booking.into()))
}

/// POST /v1/bookings/{id}/reschedule
async fn reschedule_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<RescheduleRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    owned_booking(&state, &caller, booking_id).await?;
    let booking = state
        .orchestrator
        .reschedule_booking(booking_id, caller.id(), req.new_event_date, req.reason)
        .await?;
    Ok(Json(booking.into()))
}

/// DELETE /v1/bookings/{id}
async fn delete_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(booking_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    caller.require_staff()?;
    state.orchestrator.delete_booking(booking_id, caller.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/customers/{customer_id}/bookings
async fn list_customer_bookings(
    State(state): State<AppState>,
    caller: Caller,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    caller.require_self_or_staff(&customer_id)?;
    let bookings = state.orchestrator.list_bookings_by_customer(&customer_id).await?;
    Ok(list_response(bookings))
}

/// GET /v1/venues/{venue_id}/bookings
async fn list_venue_bookings(
    State(state): State<AppState>,
    caller: Caller,
    Path(venue_id): Path<Uuid>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    caller.require_staff()?;
    let bookings = state.orchestrator.list_bookings_by_venue(venue_id).await?;
    Ok(list_response(bookings))
}
