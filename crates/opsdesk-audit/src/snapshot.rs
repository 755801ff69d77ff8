//! Snapshot normalization.
//!
//! Projects a fully-loaded [`ProjectDetail`] into a stable, JSON-comparable
//! snapshot. The projection is a fixed whitelist: volatile fields (row
//! timestamps, the primary key) are deliberately excluded so they cannot
//! pollute diffs with false positives. Two snapshots of logically-unchanged
//! data compare equal, which is what makes diffing them meaningful.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use opsdesk_entity::project::ProjectDetail;

/// A point-in-time projection of a project, ready to be diffed.
///
/// Snapshots are transient: built once pre-mutation and once post-mutation,
/// diffed, and discarded. They are never persisted.
pub type Snapshot = Map<String, Value>;

/// Key under which the derived per-role assignment lists are stored.
pub const ASSIGNMENTS_KEY: &str = "assignments";

/// Build a comparable snapshot from a loaded project.
///
/// Relation display names are stored beside their IDs (`team_id` + `team`)
/// so the finalizer can resolve ID changes without re-reading the entity.
/// Temporal values become RFC 3339 strings; equal instants therefore
/// compare as equal strings and differing instants diff as a clean pair.
pub fn normalize(detail: &ProjectDetail) -> Snapshot {
    let p = &detail.project;
    let mut snap = Snapshot::new();

    snap.insert("code".into(), json!(p.code));
    snap.insert("client_name".into(), json!(p.client_name));
    snap.insert("order_id".into(), json!(p.order_id));
    snap.insert("status".into(), json!(p.status.label()));
    snap.insert("tl_checked".into(), json!(p.tl_checked));
    snap.insert("delivered".into(), json!(p.delivered));

    snap.insert("team_id".into(), id_value(p.team_id));
    snap.insert(
        "team".into(),
        name_value(detail.team.as_ref().map(|t| t.name.as_str())),
    );
    snap.insert("profile_id".into(), id_value(p.profile_id));
    snap.insert(
        "profile".into(),
        name_value(detail.profile.as_ref().map(|pr| pr.name.as_str())),
    );
    snap.insert("salesperson_id".into(), id_value(p.salesperson_id));
    snap.insert(
        "salesperson".into(),
        name_value(detail.salesperson.as_ref().map(|s| s.name.as_str())),
    );

    snap.insert("start_date".into(), date_value(p.start_date));
    snap.insert("due_date".into(), date_value(p.due_date));
    snap.insert("delivered_at".into(), date_value(p.delivered_at));
    snap.insert("notes".into(), json!(p.notes));

    let roles = assignment_names(detail);
    snap.insert(
        ASSIGNMENTS_KEY.into(),
        Value::Object(
            roles
                .into_iter()
                .map(|(role, names)| (role, json!(names)))
                .collect(),
        ),
    );

    snap
}

/// Group a project's role-tagged assignments into `role -> sorted names`.
///
/// Sorting removes insertion order as a source of false-positive diffs: the
/// same member set in any order normalizes identically. Assignees whose
/// user record no longer resolves fall back to their raw ID string.
pub fn assignment_names(detail: &ProjectDetail) -> BTreeMap<String, Vec<String>> {
    let mut roles: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for assignment in &detail.assignments {
        roles
            .entry(assignment.role.clone())
            .or_default()
            .push(assignment.display_name());
    }
    for names in roles.values_mut() {
        names.sort();
    }
    roles
}

fn id_value(id: Option<Uuid>) -> Value {
    id.map_or(Value::Null, |id| Value::String(id.to_string()))
}

fn name_value(name: Option<&str>) -> Value {
    name.map_or(Value::Null, |n| Value::String(n.to_string()))
}

fn date_value(date: Option<DateTime<Utc>>) -> Value {
    date.map_or(Value::Null, |d| Value::String(d.to_rfc3339()))
}
