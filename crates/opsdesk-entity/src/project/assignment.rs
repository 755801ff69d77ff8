//! Role-tagged project assignments.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single user assigned to a project under a role category
/// (e.g. `"BACKEND"`, `"FRONTEND"`, `"QA"`).
///
/// The `user_name` field is resolved at load time by joining against the
/// employee directory; it is `None` when the referenced user has been
/// removed, in which case change tracking falls back to the raw ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoleAssignment {
    /// The project this assignment belongs to.
    pub project_id: Uuid,
    /// The assigned user.
    pub user_id: Uuid,
    /// Role category the user fills on this project.
    pub role: String,
    /// Display name of the assigned user, if still resolvable.
    pub user_name: Option<String>,
}

impl RoleAssignment {
    /// The name used for this assignee in snapshots and change logs.
    pub fn display_name(&self) -> String {
        self.user_name
            .clone()
            .unwrap_or_else(|| self.user_id.to_string())
    }
}
