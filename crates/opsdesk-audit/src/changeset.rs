//! Diff normalization and foreign-key resolution.
//!
//! Rewrites a raw structural diff into the flat, display-ready change set
//! that gets persisted on the audit entry. Two passes run in sequence:
//!
//! 1. Assignment special-casing: the engine's nested diff for the
//!    `assignments` key is discarded and the per-role change pairs are
//!    recomputed directly from the two snapshots, set-wise, so reordered
//!    member lists never show up as changes.
//! 2. Foreign-key resolution: ID-valued field changes are replaced by
//!    human-readable label pairs via batched reference lookups, keyed
//!    under the display field name.
//!
//! Everything else passes through from the raw diff unchanged.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use opsdesk_core::result::AppResult;

use crate::diff::DiffNode;
use crate::snapshot::{ASSIGNMENTS_KEY, Snapshot};
use crate::traits::{ReferenceKind, ReferenceLookup};

/// A per-role assignment change: the sorted member lists on each side.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleChange {
    /// Assignee names before the mutation.
    pub before: Vec<String>,
    /// Assignee names after the mutation.
    pub after: Vec<String>,
}

/// One entry in a finalized change set.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEntry {
    /// A `[old, new]` display-value pair.
    Pair {
        /// Display value before the mutation.
        before: Value,
        /// Display value after the mutation.
        after: Value,
    },
    /// Per-role assignment changes, only for roles that actually differ.
    Assignments(BTreeMap<String, RoleChange>),
}

/// The finalized change set written to the audit log.
///
/// Every entry represents a real difference: no-op entries are dropped
/// during finalization, never persisted as noise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    entries: BTreeMap<String, ChangeEntry>,
}

impl ChangeSet {
    /// Whether any change survived finalization.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of changed fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up a finalized entry by field name.
    pub fn get(&self, key: &str) -> Option<&ChangeEntry> {
        self.entries.get(key)
    }

    /// Serialize to the JSON shape persisted on the audit entry:
    /// `field -> [old, new]`, with assignments as
    /// `{ role -> [beforeNames, afterNames] }`.
    pub fn to_value(&self) -> Value {
        let mut out = serde_json::Map::new();
        for (key, entry) in &self.entries {
            let value = match entry {
                ChangeEntry::Pair { before, after } => json!([before, after]),
                ChangeEntry::Assignments(roles) => {
                    let mut obj = serde_json::Map::new();
                    for (role, change) in roles {
                        obj.insert(role.clone(), json!([change.before, change.after]));
                    }
                    Value::Object(obj)
                }
            };
            out.insert(key.clone(), value);
        }
        Value::Object(out)
    }
}

/// Set equality between two name lists, implemented as sorted-list
/// comparison. Kept as a named helper so the order-insensitivity
/// invariant of assignment diffs is visible and testable on its own.
pub fn sorted_equals(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}

/// A resolvable foreign-key field: which diff key it appears under, the
/// display key it is rewritten to, and the reference collection its IDs
/// point into. Adding a new resolvable relation is one line here.
struct FieldResolver {
    diff_key: &'static str,
    display_key: &'static str,
    kind: ReferenceKind,
}

const FIELD_RESOLVERS: &[FieldResolver] = &[
    FieldResolver {
        diff_key: "team_id",
        display_key: "team",
        kind: ReferenceKind::Team,
    },
    FieldResolver {
        diff_key: "profile_id",
        display_key: "profile",
        kind: ReferenceKind::Profile,
    },
    FieldResolver {
        diff_key: "salesperson_id",
        display_key: "salesperson",
        kind: ReferenceKind::Salesperson,
    },
];

/// Finalize a raw diff into the persisted change-set shape.
///
/// `before` and `after` are the same snapshots the diff was computed
/// from; the assignment pass recomputes from them rather than trusting
/// the engine's array diff. Lookup failures propagate as errors; the
/// pipeline boundary decides that they never reach the caller.
pub async fn finalize(
    raw: Option<DiffNode>,
    before: &Snapshot,
    after: &Snapshot,
    lookup: &dyn ReferenceLookup,
) -> AppResult<ChangeSet> {
    let mut raw_entries = match raw {
        None => return Ok(ChangeSet::default()),
        Some(DiffNode::Nested(entries)) => entries,
        Some(other) => {
            // Snapshots are always objects, so a non-object top-level diff
            // means the caller handed us something else entirely.
            debug!(?other, "Ignoring non-object top-level diff");
            return Ok(ChangeSet::default());
        }
    };

    let mut finalized: BTreeMap<String, ChangeEntry> = BTreeMap::new();

    // Pass 1: assignments, recomputed set-wise from the snapshots.
    if raw_entries.remove(ASSIGNMENTS_KEY).is_some() {
        let roles = assignment_changes(before, after);
        if !roles.is_empty() {
            finalized.insert(ASSIGNMENTS_KEY.into(), ChangeEntry::Assignments(roles));
        }
    }

    // Pass 2: foreign-key fields, resolved to display labels.
    for resolver in FIELD_RESOLVERS {
        let Some(node) = raw_entries.remove(resolver.diff_key) else {
            continue;
        };
        // The resolved pair fully replaces any raw entry under the
        // display key (the snapshot carries the name beside the ID, so
        // an ID change usually comes with a name change too).
        raw_entries.remove(resolver.display_key);

        let Some((before_val, after_val)) = node.as_scalar() else {
            debug!(field = resolver.diff_key, "Skipping non-scalar ID diff");
            continue;
        };
        let before_id = parse_id(before_val);
        let after_id = parse_id(after_val);

        let entry = if before_id.is_none() && after_id.is_none() {
            // Nothing to look up on either side.
            ChangeEntry::Pair {
                before: Value::Null,
                after: Value::Null,
            }
        } else {
            // The key only enters the diff when the values differ, so the
            // two IDs are never equal and need no deduplication.
            let ids: Vec<Uuid> = before_id.into_iter().chain(after_id).collect();
            let names = lookup.display_names(resolver.kind, &ids).await?;
            let resolve = |id: Option<Uuid>| match id {
                None => Value::Null,
                Some(id) => Value::String(
                    names
                        .get(&id)
                        .cloned()
                        .unwrap_or_else(|| resolver.kind.unknown_label()),
                ),
            };
            ChangeEntry::Pair {
                before: resolve(before_id),
                after: resolve(after_id),
            }
        };
        finalized.insert(resolver.display_key.into(), entry);
    }

    // Everything else passes through unchanged.
    for (key, node) in raw_entries {
        let entry = match node {
            DiffNode::Scalar { before, after } => ChangeEntry::Pair { before, after },
            // Non-scalar leftovers keep their full before/after values so
            // the persisted pair stays display-ready.
            DiffNode::Nested(_) | DiffNode::Array { .. } => ChangeEntry::Pair {
                before: before.get(&key).cloned().unwrap_or(Value::Null),
                after: after.get(&key).cloned().unwrap_or(Value::Null),
            },
        };
        finalized.insert(key, entry);
    }

    Ok(ChangeSet { entries: finalized })
}

/// Recompute per-role assignment changes from the two snapshots, over the
/// union of roles present on either side. A role is included only when
/// its member sets differ.
fn assignment_changes(before: &Snapshot, after: &Snapshot) -> BTreeMap<String, RoleChange> {
    let before_roles = role_lists(before);
    let after_roles = role_lists(after);

    let mut roles: Vec<&String> = before_roles.keys().chain(after_roles.keys()).collect();
    roles.sort();
    roles.dedup();

    let mut changes = BTreeMap::new();
    for role in roles {
        let before_names = before_roles.get(role).cloned().unwrap_or_default();
        let after_names = after_roles.get(role).cloned().unwrap_or_default();
        if !sorted_equals(&before_names, &after_names) {
            changes.insert(
                role.clone(),
                RoleChange {
                    before: before_names,
                    after: after_names,
                },
            );
        }
    }
    changes
}

/// Extract `role -> names` from a snapshot's `assignments` object.
fn role_lists(snapshot: &Snapshot) -> BTreeMap<String, Vec<String>> {
    let Some(Value::Object(roles)) = snapshot.get(ASSIGNMENTS_KEY) else {
        return BTreeMap::new();
    };
    roles
        .iter()
        .map(|(role, names)| {
            let names = names
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|n| n.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
            (role.clone(), names)
        })
        .collect()
}

fn parse_id(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(|s| Uuid::parse_str(s).ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::diff::diff;

    use super::*;

    /// In-memory reference lookup counting how many queries it served.
    struct MapLookup {
        names: HashMap<Uuid, String>,
        queries: AtomicUsize,
    }

    impl MapLookup {
        fn new(names: impl IntoIterator<Item = (Uuid, &'static str)>) -> Self {
            Self {
                names: names
                    .into_iter()
                    .map(|(id, name)| (id, name.to_string()))
                    .collect(),
                queries: AtomicUsize::new(0),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReferenceLookup for MapLookup {
        async fn display_names(
            &self,
            _kind: ReferenceKind,
            ids: &[Uuid],
        ) -> AppResult<HashMap<Uuid, String>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(ids
                .iter()
                .filter_map(|id| self.names.get(id).map(|n| (*id, n.clone())))
                .collect())
        }
    }

    fn snapshot(value: Value) -> Snapshot {
        match value {
            Value::Object(map) => map,
            _ => panic!("snapshot must be an object"),
        }
    }

    async fn run(before: Value, after: Value, lookup: &MapLookup) -> ChangeSet {
        let before = snapshot(before);
        let after = snapshot(after);
        let raw = diff(&Value::Object(before.clone()), &Value::Object(after.clone()));
        finalize(raw, &before, &after, lookup).await.unwrap()
    }

    #[test]
    fn sorted_equals_ignores_order() {
        let a = vec!["B".to_string(), "A".to_string()];
        let b = vec!["A".to_string(), "B".to_string()];
        assert!(sorted_equals(&a, &b));
        assert!(!sorted_equals(&a, &["A".to_string()]));
        assert!(!sorted_equals(&a, &["A".to_string(), "C".to_string()]));
    }

    #[tokio::test]
    async fn no_op_edit_yields_empty_change_set() {
        let lookup = MapLookup::new([]);
        let state = serde_json::json!({"client_name": "Acme", "assignments": {}});
        let set = run(state.clone(), state, &lookup).await;
        assert!(set.is_empty());
        assert_eq!(lookup.query_count(), 0);
    }

    #[tokio::test]
    async fn scalar_edit_passes_through() {
        let lookup = MapLookup::new([]);
        let set = run(
            serde_json::json!({"client_name": "Acme"}),
            serde_json::json!({"client_name": "Acme Corp"}),
            &lookup,
        )
        .await;
        assert_eq!(
            set.get("client_name"),
            Some(&ChangeEntry::Pair {
                before: serde_json::json!("Acme"),
                after: serde_json::json!("Acme Corp"),
            })
        );
    }

    #[tokio::test]
    async fn reordered_assignments_are_not_a_change() {
        let lookup = MapLookup::new([]);
        // The raw lists differ in order; set-wise they are identical.
        let set = run(
            serde_json::json!({"assignments": {"BACKEND": ["A", "B"]}}),
            serde_json::json!({"assignments": {"BACKEND": ["B", "A"]}}),
            &lookup,
        )
        .await;
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn changed_assignments_keep_only_differing_roles() {
        let lookup = MapLookup::new([]);
        let set = run(
            serde_json::json!({"assignments": {"BACKEND": ["A", "B"], "QA": ["M"]}}),
            serde_json::json!({"assignments": {"BACKEND": ["A", "C"], "QA": ["M"]}}),
            &lookup,
        )
        .await;
        let Some(ChangeEntry::Assignments(roles)) = set.get(ASSIGNMENTS_KEY) else {
            panic!("expected assignments entry");
        };
        assert_eq!(
            roles.get("BACKEND"),
            Some(&RoleChange {
                before: vec!["A".into(), "B".into()],
                after: vec!["A".into(), "C".into()],
            })
        );
        assert!(!roles.contains_key("QA"));
    }

    #[tokio::test]
    async fn role_added_on_one_side_uses_empty_other_side() {
        let lookup = MapLookup::new([]);
        let set = run(
            serde_json::json!({"assignments": {}}),
            serde_json::json!({"assignments": {"QA": ["M"]}}),
            &lookup,
        )
        .await;
        let Some(ChangeEntry::Assignments(roles)) = set.get(ASSIGNMENTS_KEY) else {
            panic!("expected assignments entry");
        };
        assert_eq!(
            roles.get("QA"),
            Some(&RoleChange {
                before: vec![],
                after: vec!["M".into()],
            })
        );
    }

    #[tokio::test]
    async fn team_change_resolves_to_labels() {
        let team1 = Uuid::new_v4();
        let team2 = Uuid::new_v4();
        let lookup = MapLookup::new([(team1, "Alpha"), (team2, "Beta")]);
        let set = run(
            serde_json::json!({"team_id": team1.to_string(), "team": "Alpha"}),
            serde_json::json!({"team_id": team2.to_string(), "team": "Beta"}),
            &lookup,
        )
        .await;
        assert_eq!(
            set.get("team"),
            Some(&ChangeEntry::Pair {
                before: serde_json::json!("Alpha"),
                after: serde_json::json!("Beta"),
            })
        );
        assert!(set.get("team_id").is_none());
        assert_eq!(lookup.query_count(), 1);
    }

    #[tokio::test]
    async fn unresolvable_id_becomes_unknown_sentinel() {
        let team1 = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let lookup = MapLookup::new([(team1, "Alpha")]);
        let set = run(
            serde_json::json!({"team_id": team1.to_string()}),
            serde_json::json!({"team_id": gone.to_string()}),
            &lookup,
        )
        .await;
        assert_eq!(
            set.get("team"),
            Some(&ChangeEntry::Pair {
                before: serde_json::json!("Alpha"),
                after: serde_json::json!("Unknown team"),
            })
        );
    }

    #[tokio::test]
    async fn cleared_reference_resolves_to_null_side() {
        let profile = Uuid::new_v4();
        let lookup = MapLookup::new([(profile, "Retainer")]);
        let set = run(
            serde_json::json!({"profile_id": profile.to_string()}),
            serde_json::json!({"profile_id": null}),
            &lookup,
        )
        .await;
        assert_eq!(
            set.get("profile"),
            Some(&ChangeEntry::Pair {
                before: serde_json::json!("Retainer"),
                after: Value::Null,
            })
        );
    }

    #[tokio::test]
    async fn null_to_null_reference_triggers_no_lookup() {
        let lookup = MapLookup::new([]);
        let set = run(
            serde_json::json!({"team_id": null, "client_name": "Acme"}),
            serde_json::json!({"team_id": null, "client_name": "Acme Corp"}),
            &lookup,
        )
        .await;
        // An unchanged null ID never enters the diff, so no entry and no query.
        assert!(set.get("team").is_none());
        assert!(set.get("team_id").is_none());
        assert_eq!(lookup.query_count(), 0);
    }

    #[tokio::test]
    async fn change_set_serializes_to_pairs() {
        let lookup = MapLookup::new([]);
        let set = run(
            serde_json::json!({"client_name": "Acme", "assignments": {"QA": ["M"]}}),
            serde_json::json!({"client_name": "Acme Corp", "assignments": {"QA": ["N"]}}),
            &lookup,
        )
        .await;
        assert_eq!(
            set.to_value(),
            serde_json::json!({
                "client_name": ["Acme", "Acme Corp"],
                "assignments": {"QA": [["M"], ["N"]]},
            })
        );
    }
}
