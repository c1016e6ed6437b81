use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unordered attribute mapping carried by every node.
pub type Attributes = BTreeMap<String, Value>;

/// Index of a node inside its document's arena.
///
/// A `NodeId` is only meaningful for the document that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the arena.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural role of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeShape {
    /// The document root.
    Document,
    /// A leaf. `content` is `true` when the leaf holds a run of content units.
    Leaf { content: bool },
    /// A list container; its children are list items.
    List,
    /// A list item; its children are arbitrary blocks, possibly nested lists.
    ListItem,
    /// Any other container, diffed by tree alignment.
    Branch,
    /// Holder of out-of-flow referenced content.
    InternalList,
    /// One referenced item inside the internal list.
    InternalItem,
}

/// Queries that decide how a pair of nodes is diffed.
pub trait DiffCapabilities {
    /// The node is diffed as a single unit of content.
    fn is_diffed_as_leaf(&self) -> bool;

    /// The node is flattened and diffed as a list.
    fn is_diffed_as_list(&self) -> bool;

    /// The node directly holds a run of content units.
    fn can_contain_content(&self) -> bool;

    /// The two nodes may be diffed against each other at all.
    fn is_diff_comparable(&self, other: &Self) -> bool;
}

impl DiffCapabilities for NodeShape {
    fn is_diffed_as_leaf(&self) -> bool {
        matches!(self, NodeShape::Leaf { .. })
    }

    fn is_diffed_as_list(&self) -> bool {
        matches!(self, NodeShape::List)
    }

    fn can_contain_content(&self) -> bool {
        matches!(self, NodeShape::Leaf { content: true })
    }

    fn is_diff_comparable(&self, other: &Self) -> bool {
        self == other
    }
}

/// A node in a document arena.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    /// Type identity, e.g. `"paragraph"` or `"heading"`.
    pub type_name: String,
    pub shape: NodeShape,
    pub attributes: Attributes,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Span of this node's content units in the document content buffer.
    pub content: Option<Range<usize>>,
    /// Content-bearing leaves: number of content units. Everything else:
    /// sum of `child.length + 2` over the children.
    pub length: usize,
}

impl Node {
    /// Length including this node's own open and close markers.
    pub fn outer_length(&self) -> usize {
        self.length + 2
    }
}

impl DiffCapabilities for Node {
    fn is_diffed_as_leaf(&self) -> bool {
        self.shape.is_diffed_as_leaf()
    }

    fn is_diffed_as_list(&self) -> bool {
        self.shape.is_diffed_as_list()
    }

    fn can_contain_content(&self) -> bool {
        self.shape.can_contain_content()
    }

    fn is_diff_comparable(&self, other: &Self) -> bool {
        self.shape.is_diff_comparable(&other.shape) && self.type_name == other.type_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(type_name: &str, shape: NodeShape) -> Node {
        Node {
            type_name: type_name.into(),
            shape,
            attributes: Attributes::new(),
            children: Vec::new(),
            parent: None,
            content: None,
            length: 0,
        }
    }

    #[test]
    fn shape_capabilities() {
        assert!(NodeShape::Leaf { content: true }.can_contain_content());
        assert!(NodeShape::Leaf { content: false }.is_diffed_as_leaf());
        assert!(!NodeShape::Leaf { content: false }.can_contain_content());
        assert!(NodeShape::List.is_diffed_as_list());
        assert!(!NodeShape::ListItem.is_diffed_as_list());
        assert!(!NodeShape::Branch.is_diffed_as_leaf());
    }

    #[test]
    fn comparable_requires_shape_and_type() {
        let para = node("paragraph", NodeShape::Leaf { content: true });
        let heading = node("heading", NodeShape::Leaf { content: true });
        let image = node("paragraph", NodeShape::Leaf { content: false });

        assert!(para.is_diff_comparable(&para.clone()));
        assert!(!para.is_diff_comparable(&heading));
        assert!(!para.is_diff_comparable(&image));
    }

    #[test]
    fn node_id_display() {
        let id = NodeId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(format!("{id}"), "#7");
        assert_eq!(format!("{id:?}"), "NodeId(7)");
    }

    #[test]
    fn outer_length_adds_markers() {
        let mut n = node("section", NodeShape::Branch);
        n.length = 10;
        assert_eq!(n.outer_length(), 12);
    }
}
