//! Shallow attribute diff.
//!
//! Attributes are compared as whole maps: a pair either has identical
//! attributes or carries an [`AttributeChange`] holding both full maps.
//! [`AttributeChange::key_changes`] breaks a change down per key.

use docdiff_model::Attributes;
use serde::Serialize;
use serde_json::{json, Value};

/// Old and new attribute maps of a node pair whose attributes differ.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeChange {
    pub old_attributes: Attributes,
    pub new_attributes: Attributes,
}

/// A single key-level attribute change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum KeyChange {
    Added { key: String, value: Value },
    Removed { key: String, value: Value },
    Modified { key: String, old: Value, new: Value },
}

impl KeyChange {
    pub fn key(&self) -> &str {
        match self {
            KeyChange::Added { key, .. } | KeyChange::Removed { key, .. } | KeyChange::Modified { key, .. } => key,
        }
    }
}

impl AttributeChange {
    /// Change of a single synthetic attribute, e.g. list item depth.
    pub fn single(key: &str, old: Value, new: Value) -> Self {
        Self {
            old_attributes: Attributes::from([(key.to_string(), old)]),
            new_attributes: Attributes::from([(key.to_string(), new)]),
        }
    }

    /// Per-key breakdown: removed and modified keys in old-key order, then
    /// added keys in new-key order.
    pub fn key_changes(&self) -> Vec<KeyChange> {
        let mut changes = Vec::new();

        for (key, old) in &self.old_attributes {
            match self.new_attributes.get(key) {
                Some(new) if new != old => changes.push(KeyChange::Modified {
                    key: key.clone(),
                    old: old.clone(),
                    new: new.clone(),
                }),
                Some(_) => {}
                None => changes.push(KeyChange::Removed {
                    key: key.clone(),
                    value: old.clone(),
                }),
            }
        }

        for (key, new) in &self.new_attributes {
            if !self.old_attributes.contains_key(key) {
                changes.push(KeyChange::Added {
                    key: key.clone(),
                    value: new.clone(),
                });
            }
        }

        changes
    }
}

/// Compare two attribute maps. `None` means they are identical.
pub fn diff_attributes(old: &Attributes, new: &Attributes) -> Option<AttributeChange> {
    if old == new {
        return None;
    }
    Some(AttributeChange {
        old_attributes: old.clone(),
        new_attributes: new.clone(),
    })
}

/// Compare two list item depths, reported under the `listItemDepth` key.
pub fn diff_depth(old: usize, new: usize) -> Option<AttributeChange> {
    (old != new).then(|| AttributeChange::single("listItemDepth", json!(old), json!(new)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn identical_attributes_have_no_change() {
        let a = attrs(&[("level", json!(1)), ("align", json!("left"))]);
        assert!(diff_attributes(&a, &a.clone()).is_none());
    }

    #[test]
    fn change_carries_both_maps() {
        let old = attrs(&[("level", json!(1))]);
        let new = attrs(&[("level", json!(2))]);
        let change = diff_attributes(&old, &new).unwrap();
        assert_eq!(change.old_attributes, old);
        assert_eq!(change.new_attributes, new);
    }

    #[test]
    fn key_changes_breakdown() {
        let old = attrs(&[("keep", json!(true)), ("modify", json!("old")), ("remove", json!(42))]);
        let new = attrs(&[("keep", json!(true)), ("modify", json!("new")), ("added", json!([1, 2]))]);

        let changes = diff_attributes(&old, &new).unwrap().key_changes();
        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[0],
            KeyChange::Modified {
                key: "modify".into(),
                old: json!("old"),
                new: json!("new"),
            }
        );
        assert_eq!(changes[1].key(), "remove");
        assert!(matches!(&changes[2], KeyChange::Added { key, .. } if key == "added"));
    }

    #[test]
    fn nested_values_compare_deeply() {
        let old = attrs(&[("style", json!({ "bold": false }))]);
        let new = attrs(&[("style", json!({ "bold": true }))]);
        assert!(diff_attributes(&old, &new).is_some());
    }

    #[test]
    fn depth_change_uses_list_item_depth_key() {
        assert!(diff_depth(1, 1).is_none());
        let change = diff_depth(0, 2).unwrap();
        assert_eq!(change.old_attributes, attrs(&[("listItemDepth", json!(0))]));
        assert_eq!(change.new_attributes, attrs(&[("listItemDepth", json!(2))]));
    }

    #[test]
    fn serializes_camel_case() {
        let change = diff_depth(0, 1).unwrap();
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value["oldAttributes"]["listItemDepth"], json!(0));
    }
}
