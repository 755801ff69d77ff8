//! Project persistence seam for services.

use async_trait::async_trait;
use uuid::Uuid;

use opsdesk_core::result::AppResult;
use opsdesk_database::repositories::project::{AssignmentInput, ProjectRepository};
use opsdesk_entity::project::{Project, ProjectDetail};

/// Persistence operations [`ProjectService`] needs.
///
/// Defined as a trait so service tests can run against in-memory fakes;
/// production wires in [`ProjectRepository`].
///
/// [`ProjectService`]: crate::project::ProjectService
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load a project with all relations resolved.
    async fn find_detailed(&self, id: Uuid) -> AppResult<Option<ProjectDetail>>;

    /// Persist an updated project row and optionally replace its
    /// assignment set, atomically.
    async fn apply_update(
        &self,
        project: &Project,
        assignments: Option<&[AssignmentInput]>,
    ) -> AppResult<()>;
}

#[async_trait]
impl ProjectStore for ProjectRepository {
    async fn find_detailed(&self, id: Uuid) -> AppResult<Option<ProjectDetail>> {
        ProjectRepository::find_detailed(self, id).await
    }

    async fn apply_update(
        &self,
        project: &Project,
        assignments: Option<&[AssignmentInput]>,
    ) -> AppResult<()> {
        self.update_with_assignments(project, assignments).await
    }
}
