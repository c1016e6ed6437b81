//! Ordered-sequence diff and renderable list diffs.
//!
//! [`Differ::diff_list`] runs in three passes:
//!
//! 1. Identity: each old node claims the first unclaimed identical new node.
//! 2. Matching: each remaining old node, in order, is paired with the first
//!    remaining new node that [`Differ::dispatch`] accepts. This is greedy
//!    and order dependent on purpose; it is not a global optimum.
//! 3. Moves: see [`crate::moves`].

use std::cmp::Ordering;

use docdiff_model::NodeId;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::attributes::{diff_attributes, diff_depth};
use crate::correspondence::{CorrespondenceMap, Link, Move};
use crate::diff::{ListItemChange, ListNodeDiff, NodeDiff};
use crate::differ::Differ;
use crate::flatten::flatten_list;
use crate::moves::compute_moves;

/// Ordering metadata of one sequence entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIndex {
    /// Display position the entries are sorted by.
    pub index_order: usize,
    /// Internal list item index, for internal list groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_index: Option<usize>,
}

impl ListIndex {
    pub fn ordered(index_order: usize) -> Self {
        Self {
            index_order,
            node_index: None,
        }
    }

    pub fn internal(index_order: usize, node_index: usize) -> Self {
        Self {
            index_order,
            node_index: Some(node_index),
        }
    }
}

/// Classification of one entry of a [`ListDiffInfo`].
///
/// Serializes as `0`, `1`, `-1` or the nested diff object.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemDiff {
    Unchanged,
    Inserted,
    Removed,
    Changed(Box<NodeDiff>),
}

impl Serialize for ItemDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ItemDiff::Unchanged => serializer.serialize_i8(0),
            ItemDiff::Inserted => serializer.serialize_i8(1),
            ItemDiff::Removed => serializer.serialize_i8(-1),
            ItemDiff::Changed(diff) => diff.serialize(serializer),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListDiffItem {
    #[serde(flatten)]
    pub index: ListIndex,
    pub diff: ItemDiff,
    /// Local position of the paired old entry, for unchanged and changed
    /// entries. Removed entries carry their own old position.
    #[serde(skip)]
    pub source: Option<usize>,
}

/// A merged, index-ordered view of a sequence diff, ready for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListDiffInfo {
    pub items: Vec<ListDiffItem>,
    pub changes: bool,
    pub moves: Vec<Move>,
}

impl ListDiffInfo {
    fn count(&self, pred: impl Fn(&ItemDiff) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.diff)).count()
    }

    pub fn inserted(&self) -> usize {
        self.count(|diff| matches!(diff, ItemDiff::Inserted))
    }

    pub fn removed(&self) -> usize {
        self.count(|diff| matches!(diff, ItemDiff::Removed))
    }

    pub fn changed(&self) -> usize {
        self.count(|diff| matches!(diff, ItemDiff::Changed(_)))
    }
}

/// Merge a correspondence map with both sides' index metadata.
///
/// New-side entries come first, classified by their local position, then
/// removed old entries are added; the result is stably sorted by index
/// order with removals ahead of entries sharing their position. Returns
/// `None` if nothing changed, and for non-internal lists also if nothing
/// corresponds at all.
pub fn list_diff_info(
    mut map: CorrespondenceMap,
    old_indices: &[ListIndex],
    new_indices: &[ListIndex],
    internal: bool,
) -> Option<ListDiffInfo> {
    if !internal && !map.has_correspondence() {
        return None;
    }
    if !map.has_changes() {
        return None;
    }

    let mut items: Vec<ListDiffItem> = Vec::with_capacity(new_indices.len() + map.remove.len());
    for (position, index) in new_indices.iter().enumerate() {
        let source = map.new_to_old[position].target();
        let diff = match map.new_to_old[position] {
            Link::Absent => ItemDiff::Inserted,
            Link::Unchanged { .. } => ItemDiff::Unchanged,
            Link::Changed { target, .. } => {
                match std::mem::replace(&mut map.old_to_new[target], Link::Absent) {
                    Link::Changed { diff, .. } => ItemDiff::Changed(diff),
                    _ => {
                        debug_assert!(false, "correspondence links disagree at new index {position}");
                        ItemDiff::Unchanged
                    }
                }
            }
        };
        items.push(ListDiffItem {
            index: *index,
            diff,
            source,
        });
    }
    for &old in &map.remove {
        items.push(ListDiffItem {
            index: old_indices[old],
            diff: ItemDiff::Removed,
            source: Some(old),
        });
    }

    items.sort_by(|a, b| {
        a.index.index_order.cmp(&b.index.index_order).then_with(|| {
            match (&a.diff, &b.diff) {
                (ItemDiff::Removed, ItemDiff::Removed) => Ordering::Equal,
                (ItemDiff::Removed, _) => Ordering::Less,
                (_, ItemDiff::Removed) => Ordering::Greater,
                _ => Ordering::Equal,
            }
        })
    });

    Some(ListDiffInfo {
        items,
        changes: true,
        moves: map.moves,
    })
}

impl Differ<'_> {
    /// Diff two ordered node sequences.
    pub fn diff_list(&mut self, old_nodes: &[NodeId], new_nodes: &[NodeId]) -> CorrespondenceMap {
        let mut map = CorrespondenceMap::new(old_nodes.len(), new_nodes.len());

        let mut pending_old = Vec::new();
        for (i, &old) in old_nodes.iter().enumerate() {
            let identical = (0..new_nodes.len())
                .find(|&j| map.new_to_old[j].is_absent() && self.is_identical(old, new_nodes[j]));
            match identical {
                Some(j) => map.link_unchanged(i, j),
                None => pending_old.push(i),
            }
        }
        let pending_new: Vec<usize> = (0..new_nodes.len())
            .filter(|&j| map.new_to_old[j].is_absent())
            .collect();
        debug!(
            identical = old_nodes.len() - pending_old.len(),
            pending_old = pending_old.len(),
            pending_new = pending_new.len(),
            "identity pass"
        );

        if pending_old.is_empty() {
            map.insert = pending_new;
        } else if pending_new.is_empty() {
            map.remove = pending_old;
        } else {
            self.find_modified_nodes(pending_old, pending_new, old_nodes, new_nodes, &mut map);
        }

        map.moves = compute_moves(&map);
        map
    }

    fn find_modified_nodes(
        &mut self,
        pending_old: Vec<usize>,
        pending_new: Vec<usize>,
        old_nodes: &[NodeId],
        new_nodes: &[NodeId],
        map: &mut CorrespondenceMap,
    ) {
        let mut new_left: Vec<Option<usize>> = pending_new.into_iter().map(Some).collect();
        let mut matched = 0usize;

        for i in pending_old {
            let mut found = None;
            for slot in new_left.iter_mut() {
                let Some(j) = *slot else {
                    continue;
                };
                if let Some(diff) = self.dispatch(old_nodes[i], new_nodes[j]) {
                    *slot = None;
                    found = Some((j, diff));
                    break;
                }
            }
            match found {
                Some((j, diff)) => {
                    map.link_changed(i, j, diff);
                    matched += 1;
                }
                None => map.remove.push(i),
            }
        }
        map.insert.extend(new_left.into_iter().flatten());

        debug!(
            matched,
            removed = map.remove.len(),
            inserted = map.insert.len(),
            "matching pass"
        );
    }

    /// Diff two list nodes by flattening them and diffing the flat entries.
    pub(crate) fn diff_list_nodes(&mut self, old: NodeId, new: NodeId) -> Option<ListNodeDiff> {
        let old_list = flatten_list(self.old, old);
        let new_list = flatten_list(self.new, new);
        let mut map = self.diff_list(&old_list.nodes(), &new_list.nodes());

        let pairs: Vec<(usize, usize)> = map.pairs().collect();
        for (i, j) in pairs {
            let (old_item, new_item) = (old_list.items[i], new_list.items[j]);
            let change = ListItemChange {
                list_node: diff_attributes(
                    &self.old.node(old_item.list_node).attributes,
                    &self.new.node(new_item.list_node).attributes,
                ),
                list_item: diff_attributes(
                    &self.old.node(old_item.list_item).attributes,
                    &self.new.node(new_item.list_item).attributes,
                ),
                depth: diff_depth(old_item.depth, new_item.depth),
            };
            if change.is_empty() {
                continue;
            }

            let inner = match std::mem::replace(&mut map.old_to_new[i], Link::Absent) {
                Link::Changed { diff, .. } => Some(diff),
                _ => None,
            };
            map.link_changed(
                i,
                j,
                NodeDiff::ListItem {
                    attribute_change: change,
                    inner,
                },
            );
        }

        let info = list_diff_info(map, &old_list.indices(), &new_list.indices(), false)?;
        Some(ListNodeDiff {
            info,
            old_list,
            new_list,
        })
    }
}
