//! Batched display-name lookups against the reference collections.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use opsdesk_audit::{ReferenceKind, ReferenceLookup};
use opsdesk_core::error::{AppError, ErrorKind};
use opsdesk_core::result::AppResult;
use opsdesk_entity::reference::{Profile, Salesperson, Team};

/// Repository over the team/profile/salesperson reference tables.
///
/// Implements [`ReferenceLookup`] for the change-tracking pipeline:
/// one `ANY($1)` query per diffed foreign-key field, never per ID.
#[derive(Debug, Clone)]
pub struct ReferenceRepository {
    pool: PgPool,
}

impl ReferenceRepository {
    /// Create a new reference repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load all teams, for admin screens.
    pub async fn all_teams(&self) -> AppResult<Vec<Team>> {
        sqlx::query_as::<_, Team>("SELECT id, name FROM teams ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load teams", e))
    }

    /// Load all service profiles.
    pub async fn all_profiles(&self) -> AppResult<Vec<Profile>> {
        sqlx::query_as::<_, Profile>("SELECT id, name FROM profiles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load profiles", e))
    }

    /// Load all salespeople.
    pub async fn all_salespeople(&self) -> AppResult<Vec<Salesperson>> {
        sqlx::query_as::<_, Salesperson>("SELECT id, name FROM salespeople ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load salespeople", e)
            })
    }

    fn table_for(kind: ReferenceKind) -> &'static str {
        match kind {
            ReferenceKind::Team => "teams",
            ReferenceKind::Profile => "profiles",
            ReferenceKind::Salesperson => "salespeople",
        }
    }
}

#[async_trait]
impl ReferenceLookup for ReferenceRepository {
    async fn display_names(
        &self,
        kind: ReferenceKind,
        ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT id, name FROM {} WHERE id = ANY($1)",
            Self::table_for(kind)
        );
        let rows: Vec<(Uuid, String)> = sqlx::query_as(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to resolve {kind} names"),
                    e,
                )
            })?;

        // IDs with no matching row are simply absent; the pipeline
        // substitutes its "Unknown <kind>" sentinel.
        Ok(rows.into_iter().collect())
    }
}
