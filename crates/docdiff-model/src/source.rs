//! Serializable source form of a document and the builder that turns it into
//! a [`Document`] arena.
//!
//! ```json
//! {
//!   "body": [
//!     { "type": "paragraph", "shape": "content",
//!       "content": [ { "text": "Hello", "annotations": [ { "type": "bold" } ] } ] }
//!   ],
//!   "internalList": { "items": [ { "group": "", "key": "a", "children": [] } ] }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::{Annotation, AnnotationRef, ContentStore, ContentUnit, InlineNode};
use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::internal_list::{InternalList, ReferenceKey};
use crate::node::{Attributes, DiffCapabilities, Node, NodeId, NodeShape};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSource {
    #[serde(default)]
    pub body: Vec<NodeSource>,
    #[serde(default)]
    pub internal_list: Option<InternalListSource>,
}

/// Shape names accepted in source documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeSource {
    /// A leaf holding a content run.
    Content,
    /// A leaf without content (images, embeds).
    Leaf,
    List,
    ListItem,
    #[default]
    Branch,
}

impl From<ShapeSource> for NodeShape {
    fn from(shape: ShapeSource) -> Self {
        match shape {
            ShapeSource::Content => NodeShape::Leaf { content: true },
            ShapeSource::Leaf => NodeShape::Leaf { content: false },
            ShapeSource::List => NodeShape::List,
            ShapeSource::ListItem => NodeShape::ListItem,
            ShapeSource::Branch => NodeShape::Branch,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSource {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub shape: ShapeSource,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub children: Vec<NodeSource>,
    #[serde(default)]
    pub content: Vec<RunSource>,
}

/// A run of leaf content: annotated text or a single inline node.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunSource {
    Text {
        text: String,
        #[serde(default)]
        annotations: Vec<Annotation>,
    },
    Inline {
        inline: InlineSource,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InlineSource {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub reference: Option<ReferenceKey>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalListSource {
    #[serde(default)]
    pub items: Vec<InternalItemSource>,
    /// Explicit display order per group. Groups not listed get
    /// first-reference order.
    #[serde(default)]
    pub index_order: BTreeMap<String, Vec<Option<usize>>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InternalItemSource {
    pub group: String,
    pub key: String,
    #[serde(default)]
    pub children: Vec<NodeSource>,
}

#[derive(Default)]
struct Builder {
    nodes: Vec<Node>,
    content: Vec<ContentUnit>,
    store: ContentStore,
}

impl Builder {
    fn push(&mut self, type_name: &str, shape: NodeShape, attributes: Attributes, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            type_name: type_name.to_string(),
            shape,
            attributes,
            children: Vec::new(),
            parent,
            content: None,
            length: 0,
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    fn finish_length(&mut self, id: NodeId) {
        let length = self.nodes[id.index()]
            .children
            .iter()
            .map(|child| self.nodes[child.index()].outer_length())
            .sum();
        self.nodes[id.index()].length = length;
    }

    fn build_node(&mut self, source: &NodeSource, parent: NodeId) -> ModelResult<NodeId> {
        let shape = NodeShape::from(source.shape);
        let parent_shape = self.nodes[parent.index()].shape;

        if parent_shape == NodeShape::List && shape != NodeShape::ListItem {
            return Err(ModelError::InvalidStructure(format!(
                "list may only contain list items, found {:?}",
                source.type_name
            )));
        }
        if !source.content.is_empty() && !shape.can_contain_content() {
            return Err(ModelError::InvalidStructure(format!(
                "{:?} cannot hold content",
                source.type_name
            )));
        }
        if shape.is_diffed_as_leaf() && !source.children.is_empty() {
            return Err(ModelError::InvalidStructure(format!(
                "leaf {:?} cannot have children",
                source.type_name
            )));
        }

        let id = self.push(&source.type_name, shape, source.attributes.clone(), Some(parent));

        if shape.can_contain_content() {
            let start = self.content.len();
            for run in &source.content {
                self.push_run(run);
            }
            let end = self.content.len();
            let node = &mut self.nodes[id.index()];
            node.content = Some(start..end);
            node.length = end - start;
        } else {
            for child in &source.children {
                self.build_node(child, id)?;
            }
            self.finish_length(id);
        }
        Ok(id)
    }

    fn intern_all(&mut self, annotations: &[Annotation]) -> Vec<AnnotationRef> {
        annotations
            .iter()
            .map(|annotation| self.store.intern(annotation.clone()))
            .collect()
    }

    fn push_run(&mut self, run: &RunSource) {
        match run {
            RunSource::Text { text, annotations } => {
                let refs = self.intern_all(annotations);
                self.content.extend(text.chars().map(|ch| ContentUnit::Text {
                    ch,
                    annotations: refs.clone(),
                }));
            }
            RunSource::Inline { inline } => {
                let annotations = self.intern_all(&inline.annotations);
                self.content.push(ContentUnit::Inline(InlineNode {
                    type_name: inline.type_name.clone(),
                    attributes: inline.attributes.clone(),
                    annotations,
                    reference: inline.reference.clone(),
                    override_index: None,
                }));
            }
        }
    }
}

impl Document {
    /// Build a document arena from its source form.
    pub fn from_source(source: &DocumentSource) -> ModelResult<Document> {
        let mut builder = Builder::default();
        let root = builder.push("document", NodeShape::Document, Attributes::new(), None);

        for child in &source.body {
            builder.build_node(child, root)?;
        }

        let mut internal_list = InternalList::default();
        if let Some(list_source) = &source.internal_list {
            let list = builder.push("internalList", NodeShape::InternalList, Attributes::new(), Some(root));
            for (index, item_source) in list_source.items.iter().enumerate() {
                let item = builder.push("internalItem", NodeShape::InternalItem, Attributes::new(), Some(list));
                for child in &item_source.children {
                    builder.build_node(child, item)?;
                }
                builder.finish_length(item);

                let group = internal_list.groups.entry(item_source.group.clone()).or_default();
                if group.keys.values().any(|key| *key == item_source.key) {
                    return Err(ModelError::InvalidStructure(format!(
                        "duplicate internal item {:?} in group {:?}",
                        item_source.key, item_source.group
                    )));
                }
                group.keys.insert(index, item_source.key.clone());
            }
            builder.finish_length(list);
            internal_list.node = Some(list);
        }
        builder.finish_length(root);

        let mut doc = Document {
            nodes: builder.nodes,
            root,
            content: builder.content,
            store: builder.store,
            internal_list,
            read_only: false,
        };
        doc.rebuild_references(true)?;

        if let Some(list_source) = &source.internal_list {
            for (name, order) in &list_source.index_order {
                let group = doc.internal_list.groups.get_mut(name).ok_or_else(|| {
                    ModelError::InvalidStructure(format!("index order for unknown group {name:?}"))
                })?;
                if let Some(item) = order.iter().flatten().find(|item| !group.keys.contains_key(*item)) {
                    return Err(ModelError::InvalidStructure(format!(
                        "index order for group {name:?} names unknown item {item}"
                    )));
                }
                group.index_order = order.clone();
            }
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_list() {
        let doc = Document::from_json(
            r#"{ "body": [ { "type": "list", "shape": "list", "attributes": { "style": "bullet" },
                "children": [
                    { "type": "listItem", "shape": "listItem", "children": [
                        { "type": "paragraph", "shape": "content", "content": [ { "text": "one" } ] },
                        { "type": "list", "shape": "list", "children": [
                            { "type": "listItem", "shape": "listItem", "children": [
                                { "type": "paragraph", "shape": "content", "content": [ { "text": "two" } ] }
                            ] } ] }
                    ] } ] } ] }"#,
        )
        .unwrap();

        let list = doc.body_children()[0];
        assert_eq!(doc.node(list).shape, NodeShape::List);
        // item(para(3)+2 + list(item(para(3)+2)+2)+2) + 2
        assert_eq!(doc.node(list).length, 16);
    }

    #[test]
    fn list_rejects_non_items() {
        let err = Document::from_json(
            r#"{ "body": [ { "type": "list", "shape": "list", "children": [
                { "type": "paragraph", "shape": "content" } ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidStructure(_)));
    }

    #[test]
    fn content_on_branch_is_rejected() {
        let err = Document::from_json(
            r#"{ "body": [ { "type": "section", "content": [ { "text": "x" } ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidStructure(_)));
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let err = Document::from_json(
            r#"{ "body": [ { "type": "p", "shape": "content", "content": [
                { "inline": { "type": "ref", "reference": { "group": "g", "key": "missing" } } } ] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::UnknownReference { .. }));
    }

    #[test]
    fn explicit_index_order_overrides_reference_order() {
        let doc = Document::from_json(
            r#"{ "body": [],
                 "internalList": {
                    "items": [ { "group": "notes", "key": "a" }, { "group": "notes", "key": "b" } ],
                    "indexOrder": { "notes": [ 1, null, 0 ] } } }"#,
        )
        .unwrap();
        let group = doc.internal_list().group("notes").unwrap();
        assert_eq!(group.index_order, vec![Some(1), None, Some(0)]);
    }

    #[test]
    fn unreferenced_items_have_no_default_order() {
        let doc = Document::from_json(
            r#"{ "internalList": { "items": [ { "group": "notes", "key": "a" } ] } }"#,
        )
        .unwrap();
        assert!(doc.internal_list().group("notes").unwrap().index_order.is_empty());
    }

    #[test]
    fn duplicate_item_key_is_rejected() {
        let err = Document::from_json(
            r#"{ "internalList": { "items": [
                { "group": "g", "key": "a" }, { "group": "g", "key": "a" } ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidStructure(_)));
    }

    #[test]
    fn annotations_are_interned_once() {
        let doc = Document::from_json(
            r#"{ "body": [ { "type": "p", "shape": "content", "content": [
                { "text": "ab", "annotations": [ { "type": "bold" } ] },
                { "text": "c", "annotations": [ { "type": "bold" } ] } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(doc.store().len(), 1);
    }
}
