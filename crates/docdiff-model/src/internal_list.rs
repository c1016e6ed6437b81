//! Out-of-flow referenced content (footnotes, citations).
//!
//! Internal items live as children of the internal list node. Inline
//! reference nodes in content point at an item through a [`ReferenceKey`].
//! Each reference group keeps its own display order (`index_order`), which is
//! independent of where the items sit in the internal list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Identifies one internal item: its reference group and list key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceKey {
    pub group: String,
    pub key: String,
}

impl ReferenceKey {
    pub fn new(group: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
        }
    }
}

/// A named bucket of internal items with an explicit display order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReferenceGroup {
    /// Display position -> internal item index. `None` marks an empty slot.
    pub index_order: Vec<Option<usize>>,
    /// Internal item index -> list key.
    pub keys: BTreeMap<usize, String>,
}

impl ReferenceGroup {
    /// `(display position, internal item index)` for every occupied slot.
    pub fn ordered_items(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.index_order
            .iter()
            .enumerate()
            .filter_map(|(position, item)| item.map(|item| (position, item)))
    }

    pub fn key_for(&self, item: usize) -> Option<&str> {
        self.keys.get(&item).map(String::as_str)
    }
}

/// The internal list of a document.
#[derive(Clone, Debug, Default)]
pub struct InternalList {
    pub(crate) node: Option<NodeId>,
    pub(crate) groups: BTreeMap<String, ReferenceGroup>,
    /// Content offsets of every inline node referencing a given item.
    pub(crate) references: BTreeMap<ReferenceKey, Vec<usize>>,
}

impl InternalList {
    /// The internal list node, if the document has one.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn groups(&self) -> &BTreeMap<String, ReferenceGroup> {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&ReferenceGroup> {
        self.groups.get(name)
    }

    /// Content offsets of the inline nodes that refer to `key`.
    pub fn references_to(&self, key: &ReferenceKey) -> &[usize] {
        self.references.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Override indices replaced by a freeze, so they can be put back exactly.
#[derive(Debug, Default, PartialEq, Eq)]
#[must_use = "frozen indices must be restored"]
pub struct FrozenIndices {
    pub(crate) previous: Vec<(usize, Option<usize>)>,
}

impl FrozenIndices {
    /// Number of inline nodes that were annotated.
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}
