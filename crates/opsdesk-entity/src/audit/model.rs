//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable audit log entry recording one mutation of a tracked record.
///
/// Entries are append-only: nothing in this subsystem ever updates or
/// deletes one. Retention is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: Uuid,
    /// The user who performed the action.
    pub actor_id: Uuid,
    /// The action that was performed (e.g. `"project.update"`).
    pub action: String,
    /// The type of target record (e.g. `"project"`).
    pub target_type: String,
    /// The target record ID.
    pub target_id: Uuid,
    /// Normalized change set: field name to `[old, new]` display pair,
    /// with assignment changes keyed per role. `None` for no-op edits.
    pub changes: Option<serde_json::Value>,
    /// Free-form metadata shown in activity feeds (title, status label,
    /// profile label, order ID, or action-specific fields).
    pub metadata: Option<serde_json::Value>,
    /// IP address of the actor, empty string when unavailable.
    pub ip_address: String,
    /// User-Agent of the actor, empty string when unavailable.
    pub user_agent: String,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to append a new audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    /// The user who performed the action.
    pub actor_id: Uuid,
    /// The action performed.
    pub action: String,
    /// Target record type.
    pub target_type: String,
    /// Target record ID.
    pub target_id: Uuid,
    /// Normalized change set, `None` when the edit changed nothing.
    pub changes: Option<serde_json::Value>,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
    /// Actor's IP address.
    pub ip_address: String,
    /// Actor's User-Agent.
    pub user_agent: String,
}
