//! Flattening of nested lists.
//!
//! A list is walked item by item. Non-list children of an item become
//! entries of the flat sequence; nested lists are walked recursively one
//! level deeper. Two identical sibling sub-lists in one item therefore
//! flatten to the same shape.

use docdiff_model::{DiffCapabilities, Document, NodeId};
use serde::Serialize;

use crate::list::ListIndex;

/// One entry of a flattened list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatItem {
    pub node: NodeId,
    pub list_node: NodeId,
    pub list_item: NodeId,
    pub depth: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlatList {
    pub items: Vec<FlatItem>,
}

impl FlatList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.items.iter().map(|item| item.node).collect()
    }

    /// Index metadata: each entry's index order is its flat position.
    pub fn indices(&self) -> Vec<ListIndex> {
        (0..self.items.len()).map(ListIndex::ordered).collect()
    }
}

pub fn flatten_list(doc: &Document, list: NodeId) -> FlatList {
    let mut flat = FlatList::default();
    walk(doc, list, 0, &mut flat);
    flat
}

fn walk(doc: &Document, list: NodeId, depth: usize, flat: &mut FlatList) {
    for &list_item in doc.children(list) {
        for &node in doc.children(list_item) {
            if doc.node(node).is_diffed_as_list() {
                walk(doc, node, depth + 1, flat);
            } else {
                flat.items.push(FlatItem {
                    node,
                    list_node: list,
                    list_item,
                    depth,
                });
            }
        }
    }
}
