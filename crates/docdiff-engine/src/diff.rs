//! Result types of a node-pair comparison.

use std::collections::BTreeMap;

use docdiff_align::EditOp;
use docdiff_model::NodeId;
use serde::Serialize;

use crate::attributes::AttributeChange;
use crate::flatten::FlatList;
use crate::linear::LinearDiff;
use crate::list::ListDiffInfo;

/// The diff of two corresponding, non-identical nodes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeDiff {
    Leaf(LeafDiff),
    List(ListNodeDiff),
    Tree(TreeNodeDiff),
    /// A flattened list entry whose owning list, list item or depth changed.
    /// `inner` is the diff of the entry itself, absent if its content is
    /// identical.
    #[serde(rename_all = "camelCase")]
    ListItem {
        attribute_change: ListItemChange,
        inner: Option<Box<NodeDiff>>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafDiff {
    pub attribute_change: Option<AttributeChange>,
    /// `None` for leaves without content.
    pub linear_diff: Option<LinearDiff>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodeDiff {
    pub info: ListDiffInfo,
    pub old_list: FlatList,
    pub new_list: FlatList,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemChange {
    #[serde(rename = "listNodeAttributeChange", skip_serializing_if = "Option::is_none")]
    pub list_node: Option<AttributeChange>,
    #[serde(rename = "listItemAttributeChange", skip_serializing_if = "Option::is_none")]
    pub list_item: Option<AttributeChange>,
    #[serde(rename = "depthChange", skip_serializing_if = "Option::is_none")]
    pub depth: Option<AttributeChange>,
}

impl ListItemChange {
    pub fn is_empty(&self) -> bool {
        self.list_node.is_none() && self.list_item.is_none() && self.depth.is_none()
    }
}

/// Detail for one changed pair of a tree alignment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairDiff {
    pub attribute_change: Option<AttributeChange>,
    /// Content diff of two content leaves; `None` for branches or when the
    /// content diff was skipped for lack of time.
    pub linear_diff: Option<LinearDiff>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNodeDiff {
    /// Edit script; indices are post-order positions in the ordered node lists.
    pub script: Vec<EditOp>,
    /// Pair detail keyed by position in `script`.
    pub diff_info: BTreeMap<usize, PairDiff>,
    pub old_ordered: Vec<NodeId>,
    pub new_ordered: Vec<NodeId>,
    /// Old post-order index to new post-order index.
    pub correspondence_old_to_new: Vec<Option<usize>>,
    /// New post-order index to old post-order index.
    pub correspondence_new_to_old: Vec<Option<usize>>,
}
