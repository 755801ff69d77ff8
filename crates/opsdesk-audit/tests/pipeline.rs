//! End-to-end tests for the change-tracking pipeline, driven through
//! in-memory collaborator fakes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use opsdesk_audit::{AuditPipeline, AuditSink, ReferenceKind, ReferenceLookup, RequestMeta};
use opsdesk_core::config::audit::AuditConfig;
use opsdesk_core::error::AppError;
use opsdesk_core::result::AppResult;
use opsdesk_entity::audit::{AuditLogEntry, CreateAuditLogEntry};
use opsdesk_entity::project::{Project, ProjectDetail, ProjectStatus, RoleAssignment};
use opsdesk_entity::reference::Team;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opsdesk_audit=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// In-memory reference lookup.
#[derive(Default)]
struct FakeLookup {
    names: HashMap<Uuid, String>,
}

impl FakeLookup {
    fn with(names: impl IntoIterator<Item = (Uuid, &'static str)>) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|(id, n)| (id, n.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl ReferenceLookup for FakeLookup {
    async fn display_names(
        &self,
        _kind: ReferenceKind,
        ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.names.get(id).map(|n| (*id, n.clone())))
            .collect())
    }
}

/// In-memory audit sink collecting appended entries.
#[derive(Default)]
struct MemorySink {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl MemorySink {
    fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn append(&self, entry: CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        let stored = AuditLogEntry {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            changes: entry.changes,
            metadata: entry.metadata,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: Utc::now(),
        };
        self.entries.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}

/// A sink that always fails, for exercising the detached-task boundary.
struct BrokenSink;

#[async_trait]
impl AuditSink for BrokenSink {
    async fn append(&self, _entry: CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        Err(AppError::database("connection reset"))
    }
}

fn project(team_id: Option<Uuid>) -> Project {
    Project {
        id: Uuid::new_v4(),
        code: "FSD-007".into(),
        client_name: "Acme".into(),
        order_id: Some("PO-1".into()),
        status: ProjectStatus::InProgress,
        tl_checked: false,
        delivered: false,
        team_id,
        profile_id: None,
        salesperson_id: None,
        start_date: Some(Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap()),
        due_date: None,
        delivered_at: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn detail(project: Project, team: Option<Team>, assignments: Vec<RoleAssignment>) -> ProjectDetail {
    ProjectDetail {
        project,
        team,
        profile: None,
        salesperson: None,
        assignments,
    }
}

fn assignee(project_id: Uuid, role: &str, name: &str) -> RoleAssignment {
    RoleAssignment {
        project_id,
        user_id: Uuid::new_v4(),
        role: role.into(),
        user_name: Some(name.into()),
    }
}

fn pipeline_with(lookup: FakeLookup, sink: Arc<dyn AuditSink>) -> AuditPipeline {
    AuditPipeline::new(Arc::new(lookup), sink, AuditConfig::default())
}

#[tokio::test]
async fn scalar_edit_is_recorded_with_display_pair() {
    init_tracing();
    let sink = Arc::new(MemorySink::default());
    let pipeline = pipeline_with(FakeLookup::default(), sink.clone());

    let before = detail(project(None), None, vec![]);
    let mut after = before.clone();
    after.project.client_name = "Acme Corp".into();

    let actor = Uuid::new_v4();
    let meta = RequestMeta {
        ip: "10.0.0.7".into(),
        user_agent: "opsdesk-web".into(),
    };
    pipeline
        .project_updated(&before, &after, actor, &meta)
        .await
        .unwrap();

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.action, "project.update");
    assert_eq!(entry.target_type, "project");
    assert_eq!(entry.target_id, before.project.id);
    assert_eq!(entry.actor_id, actor);
    assert_eq!(entry.ip_address, "10.0.0.7");
    assert_eq!(
        entry.changes.as_ref().unwrap()["client_name"],
        json!(["Acme", "Acme Corp"])
    );
    let metadata = entry.metadata.as_ref().unwrap();
    assert_eq!(metadata["title"], json!("FSD-007 - Acme Corp"));
    assert_eq!(metadata["status"], json!("In progress"));
}

#[tokio::test]
async fn team_change_is_recorded_as_label_pair() {
    init_tracing();
    let team1 = Uuid::new_v4();
    let team2 = Uuid::new_v4();
    let sink = Arc::new(MemorySink::default());
    let pipeline = pipeline_with(
        FakeLookup::with([(team1, "Alpha"), (team2, "Beta")]),
        sink.clone(),
    );

    let before = detail(
        project(Some(team1)),
        Some(Team {
            id: team1,
            name: "Alpha".into(),
        }),
        vec![],
    );
    let mut after = before.clone();
    after.project.team_id = Some(team2);
    after.team = Some(Team {
        id: team2,
        name: "Beta".into(),
    });

    pipeline
        .project_updated(&before, &after, Uuid::new_v4(), &RequestMeta::default())
        .await
        .unwrap();

    let changes = sink.entries()[0].changes.clone().unwrap();
    assert_eq!(changes["team"], json!(["Alpha", "Beta"]));
    assert!(changes.get("team_id").is_none());
}

#[tokio::test]
async fn assignment_reorder_produces_no_change_entry() {
    init_tracing();
    let sink = Arc::new(MemorySink::default());
    let pipeline = pipeline_with(FakeLookup::default(), sink.clone());

    let p = project(None);
    let ann = assignee(p.id, "BACKEND", "Ann");
    let zoe = assignee(p.id, "BACKEND", "Zoe");
    let before = detail(p.clone(), None, vec![ann.clone(), zoe.clone()]);
    let after = detail(p, None, vec![zoe, ann]);

    pipeline
        .project_updated(&before, &after, Uuid::new_v4(), &RequestMeta::default())
        .await
        .unwrap();

    // Same member set: recorded as a no-op edit with a null change set.
    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].changes.is_none());
}

#[tokio::test]
async fn assignment_membership_change_is_recorded_per_role() {
    init_tracing();
    let sink = Arc::new(MemorySink::default());
    let pipeline = pipeline_with(FakeLookup::default(), sink.clone());

    let p = project(None);
    let ann = assignee(p.id, "BACKEND", "Ann");
    let before = detail(p.clone(), None, vec![ann.clone(), assignee(p.id, "BACKEND", "Ben")]);
    let after = detail(p, None, vec![ann, assignee(before.project.id, "BACKEND", "Cleo")]);

    pipeline
        .project_updated(&before, &after, Uuid::new_v4(), &RequestMeta::default())
        .await
        .unwrap();

    let changes = sink.entries()[0].changes.clone().unwrap();
    assert_eq!(
        changes["assignments"]["BACKEND"],
        json!([["Ann", "Ben"], ["Ann", "Cleo"]])
    );
}

#[tokio::test]
async fn no_op_edit_can_be_skipped_by_config() {
    init_tracing();
    let sink = Arc::new(MemorySink::default());
    let pipeline = AuditPipeline::new(
        Arc::new(FakeLookup::default()),
        sink.clone(),
        AuditConfig {
            enabled: true,
            record_no_op: false,
        },
    );

    let before = detail(project(None), None, vec![]);
    let after = before.clone();
    pipeline
        .project_updated(&before, &after, Uuid::new_v4(), &RequestMeta::default())
        .await
        .unwrap();

    assert!(sink.entries().is_empty());
}

#[tokio::test]
async fn disabled_pipeline_writes_nothing() {
    init_tracing();
    let sink = Arc::new(MemorySink::default());
    let pipeline = AuditPipeline::new(
        Arc::new(FakeLookup::default()),
        sink.clone(),
        AuditConfig {
            enabled: false,
            record_no_op: true,
        },
    );

    let before = detail(project(None), None, vec![]);
    let mut after = before.clone();
    after.project.client_name = "Changed".into();
    pipeline
        .project_updated(&before, &after, Uuid::new_v4(), &RequestMeta::default())
        .await
        .unwrap();

    assert!(sink.entries().is_empty());
}

#[tokio::test]
async fn detached_task_swallows_sink_failure() {
    init_tracing();
    let pipeline = AuditPipeline::new(
        Arc::new(FakeLookup::default()),
        Arc::new(BrokenSink),
        AuditConfig::default(),
    );

    let before = detail(project(None), None, vec![]);
    let mut after = before.clone();
    after.project.client_name = "Changed".into();

    let handle =
        pipeline.spawn_project_updated(before, after, Uuid::new_v4(), RequestMeta::default());
    // The task completes cleanly; the failure is logged, not propagated.
    handle.await.unwrap();
}
