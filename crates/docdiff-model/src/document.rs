//! The document arena.
//!
//! A [`Document`] stores every node in one vector, addressed by [`NodeId`],
//! plus a flat content buffer that content-bearing leaves index into. The
//! internal list sits as the last child of the root and is excluded from
//! [`Document::body_children`].
//!
//! # Invariants
//!
//! - `nodes[root]` has shape [`NodeShape::Document`].
//! - Every node's `length` follows the length rule documented on [`Node`].
//! - Every inline reference in `content` names an existing internal item.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::content::{ContentStore, ContentUnit, InlineNode, ResolvedUnit};
use crate::error::{ModelError, ModelResult};
use crate::internal_list::{FrozenIndices, InternalList, ReferenceKey};
use crate::node::{Attributes, DiffCapabilities, Node, NodeId, NodeShape};
use crate::source::DocumentSource;

/// One element of a node's outer linearization.
#[derive(Clone, Debug, PartialEq)]
pub enum LinearItem<'a> {
    Open {
        type_name: &'a str,
        shape: NodeShape,
        attributes: &'a Attributes,
    },
    Unit(&'a ContentUnit),
    Close {
        type_name: &'a str,
    },
}

impl LinearItem<'_> {
    /// Equality that resolves annotation refs through each side's store, so
    /// differently interned but equal annotations compare equal.
    pub fn equivalent(&self, store: &ContentStore, other: &LinearItem<'_>, other_store: &ContentStore) -> bool {
        match (self, other) {
            (LinearItem::Unit(a), LinearItem::Unit(b)) => store.resolve(a) == other_store.resolve(b),
            _ => self == other,
        }
    }
}

/// An immutable-by-default snapshot of a structured document.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) content: Vec<ContentUnit>,
    pub(crate) store: ContentStore,
    pub(crate) internal_list: InternalList,
    pub(crate) read_only: bool,
}

impl Document {
    /// Parse a JSON [`DocumentSource`] and build a document from it.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let source: DocumentSource = serde_json::from_str(json)?;
        Self::from_source(&source)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Top-level children of the document, excluding the internal list node.
    pub fn body_children(&self) -> Vec<NodeId> {
        self.node(self.root)
            .children
            .iter()
            .copied()
            .filter(|child| self.node(*child).shape != NodeShape::InternalList)
            .collect()
    }

    pub fn internal_list(&self) -> &InternalList {
        &self.internal_list
    }

    /// Children of the internal list node (empty if there is none).
    pub fn internal_items(&self) -> &[NodeId] {
        match self.internal_list.node {
            Some(list) => self.children(list),
            None => &[],
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Content units held by `id`; empty for nodes without content.
    pub fn content(&self, id: NodeId) -> &[ContentUnit] {
        match &self.node(id).content {
            Some(range) => &self.content[range.clone()],
            None => &[],
        }
    }

    pub fn resolve_unit(&self, unit: &ContentUnit) -> ResolvedUnit {
        self.store.resolve(unit)
    }

    pub fn resolved_content(&self, id: NodeId) -> Vec<ResolvedUnit> {
        self.content(id).iter().map(|u| self.store.resolve(u)).collect()
    }

    /// Plain text of a node's content, with inline nodes rendered as U+FFFC.
    pub fn text(&self, id: NodeId) -> String {
        self.content(id)
            .iter()
            .map(|unit| match unit {
                ContentUnit::Text { ch, .. } => *ch,
                ContentUnit::Inline(_) => '\u{fffc}',
            })
            .collect()
    }

    /// Outer linearization of `id`: open marker, children or content, close marker.
    pub fn linear_data(&self, id: NodeId) -> Vec<LinearItem<'_>> {
        let mut out = Vec::with_capacity(self.node(id).outer_length());
        self.linearize(id, &mut out);
        out
    }

    fn linearize<'a>(&'a self, id: NodeId, out: &mut Vec<LinearItem<'a>>) {
        let node = self.node(id);
        out.push(LinearItem::Open {
            type_name: &node.type_name,
            shape: node.shape,
            attributes: &node.attributes,
        });
        if node.can_contain_content() {
            out.extend(self.content(id).iter().map(LinearItem::Unit));
        } else {
            for child in &node.children {
                self.linearize(*child, out);
            }
        }
        out.push(LinearItem::Close {
            type_name: &node.type_name,
        });
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn node_mut(&mut self, id: NodeId) -> ModelResult<&mut Node> {
        if self.read_only {
            return Err(ModelError::ReadOnly);
        }
        self.nodes.get_mut(id.index()).ok_or(ModelError::UnknownNode(id))
    }

    /// Set an attribute, returning the previous value.
    pub fn set_attribute(&mut self, id: NodeId, key: impl Into<String>, value: Value) -> ModelResult<Option<Value>> {
        Ok(self.node_mut(id)?.attributes.insert(key.into(), value))
    }

    /// Remove an attribute, returning the previous value.
    pub fn remove_attribute(&mut self, id: NodeId, key: &str) -> ModelResult<Option<Value>> {
        Ok(self.node_mut(id)?.attributes.remove(key))
    }

    /// Write each reference's 1-based display position into its
    /// `override_index`, so numbering is fixed before any comparison.
    pub fn freeze_internal_list_indices(&mut self) -> FrozenIndices {
        let Self { content, internal_list, .. } = self;
        let mut frozen = FrozenIndices::default();

        for (name, group) in &internal_list.groups {
            for (position, item) in group.ordered_items() {
                let Some(key) = group.key_for(item) else {
                    continue;
                };
                let reference = ReferenceKey::new(name.clone(), key);
                for offset in internal_list.references_to(&reference) {
                    if let Some(ContentUnit::Inline(inline)) = content.get_mut(*offset) {
                        frozen.previous.push((*offset, inline.override_index));
                        inline.override_index = Some(position + 1);
                    }
                }
            }
        }

        debug!(annotated = frozen.len(), "froze internal list indices");
        frozen
    }

    /// Undo a freeze, restoring every override index it replaced.
    pub fn restore_internal_list_indices(&mut self, frozen: FrozenIndices) {
        for (offset, previous) in frozen.previous.into_iter().rev() {
            if let Some(ContentUnit::Inline(inline)) = self.content.get_mut(offset) {
                inline.override_index = previous;
            }
        }
    }

    // ---------------------------------------------------------------
    // Cloning
    // ---------------------------------------------------------------

    /// Clone the whole document (`None`) or one subtree into a standalone,
    /// writable document. A cloned subtree becomes the sole body child; the
    /// internal list is always carried along.
    pub fn clone_subtree(&self, node: Option<NodeId>) -> ModelResult<Document> {
        let node = match node {
            Some(id) if id != self.root => id,
            Some(_) | None => {
                let mut doc = self.clone();
                doc.read_only = false;
                return Ok(doc);
            }
        };
        if self.get(node).is_none() {
            return Err(ModelError::UnknownNode(node));
        }

        let root = NodeId::new(0);
        let mut doc = Document {
            nodes: vec![Node {
                type_name: self.node(self.root).type_name.clone(),
                shape: NodeShape::Document,
                attributes: self.node(self.root).attributes.clone(),
                children: Vec::new(),
                parent: None,
                content: None,
                length: 0,
            }],
            root,
            content: Vec::new(),
            store: self.store.clone(),
            internal_list: InternalList {
                node: None,
                groups: self.internal_list.groups.clone(),
                references: BTreeMap::new(),
            },
            read_only: false,
        };

        let copied = doc.copy_from(self, node, root);
        doc.nodes[root.index()].children.push(copied);

        if let Some(list) = self.internal_list.node.filter(|list| *list != node) {
            let list_copy = doc.copy_from(self, list, root);
            doc.nodes[root.index()].children.push(list_copy);
            doc.internal_list.node = Some(list_copy);
        }

        doc.nodes[root.index()].length = doc.sum_child_lengths(root);
        doc.rebuild_references(false)?;
        Ok(doc)
    }

    fn copy_from(&mut self, source: &Document, id: NodeId, parent: NodeId) -> NodeId {
        let original = source.node(id);
        let new_id = NodeId::new(self.nodes.len());

        let content = original.content.as_ref().map(|range| {
            let start = self.content.len();
            self.content.extend_from_slice(&source.content[range.clone()]);
            start..self.content.len()
        });

        self.nodes.push(Node {
            children: Vec::new(),
            parent: Some(parent),
            content,
            ..original.clone()
        });

        for child in &original.children {
            let child_id = self.copy_from(source, *child, new_id);
            self.nodes[new_id.index()].children.push(child_id);
        }
        new_id
    }

    pub(crate) fn sum_child_lengths(&self, id: NodeId) -> usize {
        self.node(id)
            .children
            .iter()
            .map(|child| self.node(*child).outer_length())
            .sum()
    }

    /// Re-scan content for inline references. With `assign_order`, each
    /// group's index order is reset to first-reference order.
    pub(crate) fn rebuild_references(&mut self, assign_order: bool) -> ModelResult<()> {
        let mut references: BTreeMap<ReferenceKey, Vec<usize>> = BTreeMap::new();
        let mut first_seen: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (offset, unit) in self.content.iter().enumerate() {
            let ContentUnit::Inline(InlineNode {
                reference: Some(key),
                ..
            }) = unit
            else {
                continue;
            };
            let item = self
                .internal_list
                .groups
                .get(&key.group)
                .and_then(|group| group.keys.iter().find(|(_, k)| **k == key.key))
                .map(|(item, _)| *item)
                .ok_or_else(|| ModelError::UnknownReference {
                    group: key.group.clone(),
                    key: key.key.clone(),
                })?;

            references.entry(key.clone()).or_default().push(offset);
            let order = first_seen.entry(key.group.clone()).or_default();
            if !order.contains(&item) {
                order.push(item);
            }
        }

        if assign_order {
            for (name, group) in self.internal_list.groups.iter_mut() {
                group.index_order = first_seen
                    .get(name)
                    .map(|items| items.iter().map(|item| Some(*item)).collect())
                    .unwrap_or_default();
            }
        }

        self.internal_list.references = references;
        Ok(())
    }
}
