use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::CoreError;

/// Caller role, as asserted by the upstream identity layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Owner,
    Admin,
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Role::Customer),
            "OWNER" => Ok(Role::Owner),
            "ADMIN" => Ok(Role::Admin),
            other => Err(CoreError::IdentityError(format!("Unknown role: {}", other))),
        }
    }
}

/// Already-authenticated caller. The booking engine trusts it as given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::ValidationError("Actor id must not be empty".to_string()));
        }
        Ok(Self { id, role })
    }

    /// Owners and admins manage the reservation lifecycle
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Owner | Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("owner".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert!(matches!("guest".parse::<Role>(), Err(CoreError::IdentityError(_))));
    }

    #[test]
    fn test_actor_requires_id() {
        assert!(Actor::new("", Role::Customer).is_err());
        let owner = Actor::new("owner-1", Role::Owner).unwrap();
        assert!(owner.is_staff());
        assert!(!Actor::new("c-1", Role::Customer).unwrap().is_staff());
    }
}
