//! Collaborator seams for the change-tracking pipeline.
//!
//! The pipeline consumes exactly two external services: batched
//! display-name lookups for foreign-key resolution, and an append-only
//! sink for finished audit entries. Both are traits so the pipeline can
//! be exercised with in-memory fakes.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use opsdesk_core::result::AppResult;
use opsdesk_entity::audit::{AuditLogEntry, CreateAuditLogEntry};

/// The reference collections a diffed foreign key can point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Delivery teams.
    Team,
    /// Service profiles.
    Profile,
    /// Salespeople.
    Salesperson,
}

impl ReferenceKind {
    /// Lowercase label used in `"Unknown <kind>"` sentinels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Profile => "profile",
            Self::Salesperson => "salesperson",
        }
    }

    /// Sentinel shown when an ID no longer resolves to a record.
    pub fn unknown_label(&self) -> String {
        format!("Unknown {}", self.label())
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Batched ID-to-display-name resolution against a reference collection.
///
/// Implementations must tolerate unknown IDs by simply omitting them from
/// the returned map; the caller substitutes the `Unknown <kind>` sentinel.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Resolve display names for a set of IDs in one query.
    async fn display_names(
        &self,
        kind: ReferenceKind,
        ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, String>>;
}

/// Append-only persistence for finished audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one audit entry and return the stored row.
    async fn append(&self, entry: CreateAuditLogEntry) -> AppResult<AuditLogEntry>;
}
