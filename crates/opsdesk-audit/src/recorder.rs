//! Audit log recording.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use opsdesk_core::result::AppResult;
use opsdesk_entity::audit::{AuditLogEntry, CreateAuditLogEntry};
use opsdesk_entity::project::ProjectDetail;

use crate::changeset::ChangeSet;
use crate::traits::AuditSink;

/// Request metadata captured alongside an audit entry.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Origin IP address, empty when unavailable.
    pub ip: String,
    /// User-Agent header value, empty when unavailable.
    pub user_agent: String,
}

/// Packages finished change sets into append-only audit entries.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    /// Create a recorder writing through the given sink.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Record one project update.
    ///
    /// `detail` is the post-mutation state and is only read for metadata
    /// (title and the human labels activity feeds show); it is never
    /// re-fetched or mutated. An empty change set is tolerated and
    /// persisted with a null `changes` payload; a save that changed
    /// nothing must never fabricate a change.
    pub async fn record_project_update(
        &self,
        detail: &ProjectDetail,
        changes: &ChangeSet,
        actor_id: Uuid,
        meta: &RequestMeta,
    ) -> AppResult<AuditLogEntry> {
        let metadata = json!({
            "title": detail.title(),
            "status": detail.project.status.label(),
            "profile": detail.profile.as_ref().map(|p| p.name.clone()),
            "order_id": detail.project.order_id,
        });

        let entry = CreateAuditLogEntry {
            actor_id,
            action: "project.update".to_string(),
            target_type: "project".to_string(),
            target_id: detail.project.id,
            changes: (!changes.is_empty()).then(|| changes.to_value()),
            metadata: Some(metadata),
            ip_address: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
        };

        self.sink.append(entry).await
    }
}
