//! End-to-end change-tracking pipeline.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use opsdesk_core::config::audit::AuditConfig;
use opsdesk_core::result::AppResult;
use opsdesk_entity::project::ProjectDetail;

use crate::changeset::finalize;
use crate::diff::diff;
use crate::recorder::{AuditRecorder, RequestMeta};
use crate::snapshot::normalize;
use crate::traits::{AuditSink, ReferenceLookup};

/// Runs snapshot → diff → finalize → record for one edit operation.
///
/// The primary mutation has already committed by the time this runs, so
/// the pipeline is best-effort by contract: [`spawn_project_updated`]
/// detaches it onto its own task and only logs failures, never returning
/// them to the caller.
///
/// [`spawn_project_updated`]: AuditPipeline::spawn_project_updated
#[derive(Clone)]
pub struct AuditPipeline {
    lookup: Arc<dyn ReferenceLookup>,
    recorder: AuditRecorder,
    config: AuditConfig,
}

impl AuditPipeline {
    /// Create a pipeline over the two collaborator seams.
    pub fn new(
        lookup: Arc<dyn ReferenceLookup>,
        sink: Arc<dyn AuditSink>,
        config: AuditConfig,
    ) -> Self {
        Self {
            lookup,
            recorder: AuditRecorder::new(sink),
            config,
        }
    }

    /// Run the full pipeline synchronously, propagating failures.
    ///
    /// Callers on the request path should use
    /// [`spawn_project_updated`](Self::spawn_project_updated) instead.
    pub async fn project_updated(
        &self,
        before: &ProjectDetail,
        after: &ProjectDetail,
        actor_id: Uuid,
        meta: &RequestMeta,
    ) -> AppResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let before_snap = normalize(before);
        let after_snap = normalize(after);
        let raw = diff(
            &Value::Object(before_snap.clone()),
            &Value::Object(after_snap.clone()),
        );
        let changes = finalize(raw, &before_snap, &after_snap, self.lookup.as_ref()).await?;

        if changes.is_empty() && !self.config.record_no_op {
            debug!(project_id = %after.project.id, "Skipping no-op edit");
            return Ok(());
        }

        let entry = self
            .recorder
            .record_project_update(after, &changes, actor_id, meta)
            .await?;
        debug!(
            project_id = %after.project.id,
            entry_id = %entry.id,
            changed_fields = changes.len(),
            "Recorded project update"
        );
        Ok(())
    }

    /// Fire the pipeline as a detached task.
    ///
    /// The returned handle is for tests; production callers drop it. A
    /// pipeline failure is logged and swallowed here; it must never
    /// surface as a failure of the mutation that already committed.
    pub fn spawn_project_updated(
        &self,
        before: ProjectDetail,
        after: ProjectDetail,
        actor_id: Uuid,
        meta: RequestMeta,
    ) -> tokio::task::JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            if let Err(error) = pipeline
                .project_updated(&before, &after, actor_id, &meta)
                .await
            {
                warn!(
                    project_id = %after.project.id,
                    %error,
                    "Audit pipeline failed; primary mutation unaffected"
                );
            }
        })
    }
}
