//! Structural diff engine over JSON values.
//!
//! Compares two snapshots and produces a tree containing only the keys
//! whose values actually differ (deep structural equality). Keys that are
//! equal on both sides are entirely absent from the output; a `None`
//! result means the inputs are structurally identical.

use std::collections::BTreeMap;

use serde_json::Value;

/// One node in a structural diff tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffNode {
    /// A changed scalar value: the `[old, new]` pair.
    Scalar {
        /// Value before the mutation (`Null` when the key was absent).
        before: Value,
        /// Value after the mutation (`Null` when the key was removed).
        after: Value,
    },
    /// A changed object value: the diff of its entries.
    Nested(BTreeMap<String, DiffNode>),
    /// A changed array value, carried as the full before/after element
    /// lists. Array order sensitivity is corrected downstream for the
    /// one array-valued field this system has (assignment name lists),
    /// not here.
    Array {
        /// Elements before the mutation.
        before: Vec<Value>,
        /// Elements after the mutation.
        after: Vec<Value>,
    },
}

impl DiffNode {
    /// The `[old, new]` pair for a scalar node, if this is one.
    pub fn as_scalar(&self) -> Option<(&Value, &Value)> {
        match self {
            Self::Scalar { before, after } => Some((before, after)),
            _ => None,
        }
    }
}

/// Diff two JSON values, returning `None` when they are deeply equal.
pub fn diff(before: &Value, after: &Value) -> Option<DiffNode> {
    if before == after {
        return None;
    }

    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let mut entries = BTreeMap::new();

            for (key, before_val) in before_obj {
                let after_val = after_obj.get(key).unwrap_or(&Value::Null);
                if let Some(node) = diff(before_val, after_val) {
                    entries.insert(key.clone(), node);
                }
            }
            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    if let Some(node) = diff(&Value::Null, after_val) {
                        entries.insert(key.clone(), node);
                    }
                }
            }

            if entries.is_empty() {
                None
            } else {
                Some(DiffNode::Nested(entries))
            }
        }
        (Value::Array(before_arr), Value::Array(after_arr)) => Some(DiffNode::Array {
            before: before_arr.clone(),
            after: after_arr.clone(),
        }),
        _ => Some(DiffNode::Scalar {
            before: before.clone(),
            after: after.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn equal_values_yield_none() {
        let v = json!({"a": 1, "b": {"c": [1, 2]}});
        assert_eq!(diff(&v, &v.clone()), None);
    }

    #[test]
    fn changed_scalar_yields_pair() {
        let before = json!({"client_name": "Acme"});
        let after = json!({"client_name": "Acme Corp"});
        let DiffNode::Nested(entries) = diff(&before, &after).unwrap() else {
            panic!("expected nested diff");
        };
        assert_eq!(
            entries["client_name"],
            DiffNode::Scalar {
                before: json!("Acme"),
                after: json!("Acme Corp"),
            }
        );
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unchanged_keys_are_absent() {
        let before = json!({"a": 1, "b": 2});
        let after = json!({"a": 1, "b": 3});
        let DiffNode::Nested(entries) = diff(&before, &after).unwrap() else {
            panic!("expected nested diff");
        };
        assert!(!entries.contains_key("a"));
    }

    #[test]
    fn added_and_removed_keys_pair_with_null() {
        let before = json!({"gone": "x"});
        let after = json!({"new": "y"});
        let DiffNode::Nested(entries) = diff(&before, &after).unwrap() else {
            panic!("expected nested diff");
        };
        assert_eq!(
            entries["gone"],
            DiffNode::Scalar {
                before: json!("x"),
                after: Value::Null,
            }
        );
        assert_eq!(
            entries["new"],
            DiffNode::Scalar {
                before: Value::Null,
                after: json!("y"),
            }
        );
    }

    #[test]
    fn nested_object_change_stays_nested() {
        let before = json!({"assignments": {"QA": ["Mia"]}, "code": "X"});
        let after = json!({"assignments": {"QA": ["Mia", "Noa"]}, "code": "X"});
        let DiffNode::Nested(entries) = diff(&before, &after).unwrap() else {
            panic!("expected nested diff");
        };
        let DiffNode::Nested(inner) = &entries["assignments"] else {
            panic!("expected nested assignments diff");
        };
        assert_eq!(
            inner["QA"],
            DiffNode::Array {
                before: vec![json!("Mia")],
                after: vec![json!("Mia"), json!("Noa")],
            }
        );
    }

    #[test]
    fn null_versus_missing_is_not_a_change() {
        let before = json!({"a": null});
        let after = json!({});
        assert_eq!(diff(&before, &after), None);
    }
}
