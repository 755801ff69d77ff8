//! Audit pipeline configuration.

use serde::{Deserialize, Serialize};

/// Settings for the change-tracking / audit-log pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether the audit pipeline runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether edits with no detected field changes still produce an
    /// audit entry (with a null change set).
    #[serde(default = "default_true")]
    pub record_no_op: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            record_no_op: true,
        }
    }
}

fn default_true() -> bool {
    true
}
