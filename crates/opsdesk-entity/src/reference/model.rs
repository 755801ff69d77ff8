//! Reference record models.
//!
//! These are the small administrable collections that projects point at.
//! Change tracking resolves their IDs into the `name` fields below so that
//! audit entries read `"Alpha" -> "Beta"` rather than a UUID pair.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A delivery team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Team {
    /// Unique team identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// A service profile (billing/service category for a project).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    /// Unique profile identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// A salesperson in the employee directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Salesperson {
    /// Unique salesperson identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}
