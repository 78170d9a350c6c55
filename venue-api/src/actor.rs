use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderName},
};
use venue_core::{Actor, Role};

use crate::error::AppError;

pub const ACTOR_ID_HEADER: HeaderName = HeaderName::from_static("x-actor-id");
pub const ACTOR_ROLE_HEADER: HeaderName = HeaderName::from_static("x-actor-role");

/// The authenticated caller, as forwarded by the identity gateway in front of
/// this service. Nothing here verifies the claim.
#[derive(Debug, Clone)]
pub struct Caller(pub Actor);

impl Caller {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.0.is_staff() {
            Ok(())
        } else {
            Err(AppError::AuthorizationError("Owner or admin role required".to_string()))
        }
    }

    /// Customers may only act on their own records; staff on any
    pub fn require_self_or_staff(&self, customer_id: &str) -> Result<(), AppError> {
        if self.0.is_staff() || self.0.id == customer_id {
            Ok(())
        } else {
            Err(AppError::AuthorizationError("Not your booking".to_string()))
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &HeaderName) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, &ACTOR_ID_HEADER)
            .ok_or_else(|| AppError::AuthenticationError(format!("Missing {} header", ACTOR_ID_HEADER)))?;
        let role: Role = header(parts, &ACTOR_ROLE_HEADER)
            .ok_or_else(|| AppError::AuthenticationError(format!("Missing {} header", ACTOR_ROLE_HEADER)))?
            .parse()
            .map_err(|e: venue_core::CoreError| AppError::AuthenticationError(e.to_string()))?;

        let actor = Actor::new(id, role).map_err(|e| AppError::AuthenticationError(e.to_string()))?;
        Ok(Caller(actor))
    }
}
