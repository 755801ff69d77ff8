//! Project edit operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use opsdesk_audit::AuditPipeline;
use opsdesk_core::error::AppError;
use opsdesk_database::repositories::project::AssignmentInput;
use opsdesk_entity::project::{ProjectDetail, ProjectStatus};

use crate::context::RequestContext;
use crate::store::ProjectStore;

/// Fields an edit may change. `None` leaves a field untouched; for
/// nullable fields, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateProjectRequest {
    /// New client name.
    pub client_name: Option<String>,
    /// New external order ID.
    pub order_id: Option<Option<String>>,
    /// New workflow status.
    pub status: Option<ProjectStatus>,
    /// Team-lead sign-off flag.
    pub tl_checked: Option<bool>,
    /// Delivery flag; setting it stamps `delivered_at` the first time.
    pub delivered: Option<bool>,
    /// New owning team.
    pub team_id: Option<Option<Uuid>>,
    /// New service profile.
    pub profile_id: Option<Option<Uuid>>,
    /// New salesperson.
    pub salesperson_id: Option<Option<Uuid>>,
    /// New start date.
    pub start_date: Option<Option<DateTime<Utc>>>,
    /// New delivery deadline.
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// New notes.
    pub notes: Option<Option<String>>,
    /// Replacement assignment set (role/user pairs).
    pub assignments: Option<Vec<AssignmentRequest>>,
}

/// One requested role assignment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssignmentRequest {
    /// Role category.
    pub role: String,
    /// The user to assign.
    pub user_id: Uuid,
}

/// Handles project edit operations.
#[derive(Clone)]
pub struct ProjectService {
    /// Project persistence.
    store: Arc<dyn ProjectStore>,
    /// Change-tracking pipeline, fired after the mutation commits.
    audit: AuditPipeline,
}

impl ProjectService {
    /// Creates a new project service.
    pub fn new(store: Arc<dyn ProjectStore>, audit: AuditPipeline) -> Self {
        Self { store, audit }
    }

    /// Applies an edit to a project.
    ///
    /// The sequence is: load the pre-mutation state with relations
    /// resolved, apply the validated changes transactionally, reload the
    /// post-mutation state, then hand both states to the audit pipeline
    /// on a detached task. The returned result reflects only the primary
    /// mutation; audit failures never surface here.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: UpdateProjectRequest,
    ) -> Result<ProjectDetail, AppError> {
        if let Some(client_name) = &req.client_name {
            if client_name.trim().is_empty() {
                return Err(AppError::validation("Client name cannot be empty"));
            }
        }

        let before = self
            .store
            .find_detailed(id)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found"))?;

        let mut project = before.project.clone();
        if let Some(client_name) = req.client_name {
            project.client_name = client_name;
        }
        if let Some(order_id) = req.order_id {
            project.order_id = order_id;
        }
        if let Some(status) = req.status {
            project.status = status;
        }
        if let Some(tl_checked) = req.tl_checked {
            project.tl_checked = tl_checked;
        }
        if let Some(delivered) = req.delivered {
            project.delivered = delivered;
            if delivered && project.delivered_at.is_none() {
                project.delivered_at = Some(Utc::now());
            }
        }
        if let Some(team_id) = req.team_id {
            project.team_id = team_id;
        }
        if let Some(profile_id) = req.profile_id {
            project.profile_id = profile_id;
        }
        if let Some(salesperson_id) = req.salesperson_id {
            project.salesperson_id = salesperson_id;
        }
        if let Some(start_date) = req.start_date {
            project.start_date = start_date;
        }
        if let Some(due_date) = req.due_date {
            project.due_date = due_date;
        }
        if let Some(notes) = req.notes {
            project.notes = notes;
        }

        let assignments: Option<Vec<AssignmentInput>> = req.assignments.map(|list| {
            list.into_iter()
                .map(|a| AssignmentInput {
                    role: a.role,
                    user_id: a.user_id,
                })
                .collect()
        });

        self.store
            .apply_update(&project, assignments.as_deref())
            .await?;

        let after = self
            .store
            .find_detailed(id)
            .await?
            .ok_or_else(|| AppError::internal("Project vanished during update"))?;

        // The mutation is committed; change tracking is fire-and-forget
        // from here.
        let _ = self.audit.spawn_project_updated(
            before,
            after.clone(),
            ctx.user_id,
            ctx.audit_meta(),
        );

        info!(project_id = %id, actor = %ctx.username, "Project updated");

        Ok(after)
    }
}
