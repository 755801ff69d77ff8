//! Project repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use opsdesk_core::error::{AppError, ErrorKind};
use opsdesk_core::result::AppResult;
use opsdesk_entity::project::{Project, ProjectDetail, RoleAssignment};
use opsdesk_entity::reference::{Profile, Salesperson, Team};

/// A role/user pair to assign to a project.
#[derive(Debug, Clone)]
pub struct AssignmentInput {
    /// Role category the user fills.
    pub role: String,
    /// The user to assign.
    pub user_id: Uuid,
}

/// Repository for project rows and their role-tagged assignments.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Create a new project repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a project row by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find project", e))
    }

    /// Load a project with all relations resolved, as the change-tracking
    /// pipeline requires: team/profile/salesperson records and the
    /// assignment list with user names joined in.
    pub async fn find_detailed(&self, id: Uuid) -> AppResult<Option<ProjectDetail>> {
        let Some(project) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let team = match project.team_id {
            Some(team_id) => self.find_reference::<Team>("teams", team_id).await?,
            None => None,
        };
        let profile = match project.profile_id {
            Some(profile_id) => self.find_reference::<Profile>("profiles", profile_id).await?,
            None => None,
        };
        let salesperson = match project.salesperson_id {
            Some(sp_id) => {
                self.find_reference::<Salesperson>("salespeople", sp_id)
                    .await?
            }
            None => None,
        };

        let assignments = sqlx::query_as::<_, RoleAssignment>(
            "SELECT a.project_id, a.user_id, a.role, u.display_name AS user_name \
             FROM project_assignments a \
             LEFT JOIN users u ON u.id = a.user_id \
             WHERE a.project_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load project assignments", e)
        })?;

        Ok(Some(ProjectDetail {
            project,
            team,
            profile,
            salesperson,
            assignments,
        }))
    }

    /// Persist an updated project row and, when given, replace its
    /// assignment set. Runs as a single transaction so the mutation is
    /// atomic as a unit; the audit pipeline only starts after commit.
    pub async fn update_with_assignments(
        &self,
        project: &Project,
        assignments: Option<&[AssignmentInput]>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let updated = sqlx::query(
            "UPDATE projects SET \
             code = $2, client_name = $3, order_id = $4, status = $5, \
             tl_checked = $6, delivered = $7, team_id = $8, profile_id = $9, \
             salesperson_id = $10, start_date = $11, due_date = $12, \
             delivered_at = $13, notes = $14, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(project.id)
        .bind(&project.code)
        .bind(&project.client_name)
        .bind(&project.order_id)
        .bind(project.status)
        .bind(project.tl_checked)
        .bind(project.delivered)
        .bind(project.team_id)
        .bind(project.profile_id)
        .bind(project.salesperson_id)
        .bind(project.start_date)
        .bind(project.due_date)
        .bind(project.delivered_at)
        .bind(&project.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update project", e))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Project not found"));
        }

        if let Some(assignments) = assignments {
            sqlx::query("DELETE FROM project_assignments WHERE project_id = $1")
                .bind(project.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to clear assignments", e)
                })?;

            for assignment in assignments {
                sqlx::query(
                    "INSERT INTO project_assignments (project_id, user_id, role) \
                     VALUES ($1, $2, $3)",
                )
                .bind(project.id)
                .bind(assignment.user_id)
                .bind(&assignment.role)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to insert assignment", e)
                })?;
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit project update", e)
        })
    }

    async fn find_reference<T>(&self, table: &str, id: Uuid) -> AppResult<Option<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let sql = format!("SELECT id, name FROM {table} WHERE id = $1");
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to load {table} reference"),
                    e,
                )
            })
    }
}
