//! Project entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::reference::{Profile, Salesperson, Team};

use super::assignment::RoleAssignment;
use super::status::ProjectStatus;

/// A tracked agency project (one row in the FSD Projects sheet).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    /// Unique project identifier.
    pub id: Uuid,
    /// Short internal project code, unique per agency.
    pub code: String,
    /// Client the project is delivered for.
    pub client_name: String,
    /// External order/PO identifier, if one exists.
    pub order_id: Option<String>,
    /// Current workflow state.
    pub status: ProjectStatus,
    /// Whether the team lead has signed off on the work.
    pub tl_checked: bool,
    /// Whether the project has been marked as delivered.
    pub delivered: bool,
    /// Owning team.
    pub team_id: Option<Uuid>,
    /// Service profile the project is billed under.
    pub profile_id: Option<Uuid>,
    /// Salesperson who brought the project in.
    pub salesperson_id: Option<Uuid>,
    /// When work is scheduled to start.
    pub start_date: Option<DateTime<Utc>>,
    /// Agreed delivery deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// When the project was actually delivered.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last modified.
    pub updated_at: DateTime<Utc>,
}

/// A project together with its resolved relations, as required by the
/// change-tracking pipeline: the caller contract is that both the
/// pre-mutation and post-mutation state arrive fully loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    /// The project row itself.
    pub project: Project,
    /// Resolved owning team, if `team_id` is set and still resolvable.
    pub team: Option<Team>,
    /// Resolved service profile.
    pub profile: Option<Profile>,
    /// Resolved salesperson.
    pub salesperson: Option<Salesperson>,
    /// Role-tagged assignments with user names resolved.
    pub assignments: Vec<RoleAssignment>,
}

impl ProjectDetail {
    /// The title shown for this project in activity feeds.
    pub fn title(&self) -> String {
        format!("{} - {}", self.project.code, self.project.client_name)
    }
}
