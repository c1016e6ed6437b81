//! Node comparison and per-pair dispatch.
//!
//! A [`Differ`] holds the two read-only snapshots, the run configuration
//! and the run deadline. The sequence, list, tree and internal-list
//! strategies are further `impl Differ` blocks in their own modules.

use std::time::Instant;

use docdiff_model::{DiffCapabilities, Document, NodeId};
use tracing::{trace, warn};

use crate::attributes::diff_attributes;
use crate::change_record::ChangeRecord;
use crate::config::DiffConfig;
use crate::diff::{LeafDiff, NodeDiff};
use crate::linear::{self, LinearDiff};

/// State of one diff run over two document snapshots.
pub struct Differ<'a> {
    pub(crate) old: &'a Document,
    pub(crate) new: &'a Document,
    pub(crate) config: &'a DiffConfig,
    /// `None` if the configured timeout is too large to represent.
    deadline: Option<Instant>,
    timed_out: bool,
}

impl<'a> Differ<'a> {
    /// Start a run whose content budget ends at `config.timeout` from now.
    pub fn new(old: &'a Document, new: &'a Document, config: &'a DiffConfig) -> Self {
        Self {
            old,
            new,
            config,
            deadline: Instant::now().checked_add(config.timeout),
            timed_out: false,
        }
    }

    /// `true` once any content diff or tree alignment ran out of time.
    /// Never reset within a run.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub(crate) fn mark_timed_out(&mut self) {
        if !self.timed_out {
            warn!("diff ran out of time; remaining pairs fall back to remove and insert");
        }
        self.timed_out = true;
    }

    /// `true` if the two nodes are structurally identical: same length, diff
    /// comparable, and equal outer linear data once annotations are resolved
    /// through each document's store.
    pub fn is_identical(&self, old: NodeId, new: NodeId) -> bool {
        let (old_node, new_node) = (self.old.node(old), self.new.node(new));
        if old_node.length != new_node.length || !old_node.is_diff_comparable(new_node) {
            return false;
        }

        let old_data = self.old.linear_data(old);
        let new_data = self.new.linear_data(new);
        if old_data == new_data {
            return true;
        }
        old_data.len() == new_data.len()
            && old_data
                .iter()
                .zip(&new_data)
                .all(|(a, b)| a == b || a.equivalent(self.old.store(), b, self.new.store()))
    }

    /// Diff a candidate pair. `None` means the nodes do not correspond.
    pub fn dispatch(&mut self, old: NodeId, new: NodeId) -> Option<NodeDiff> {
        let old_node = self.old.node(old);
        if !old_node.is_diff_comparable(self.new.node(new)) {
            trace!(%old, %new, "not comparable");
            return None;
        }

        let diff = if old_node.is_diffed_as_leaf() {
            self.diff_leaf_nodes(old, new).map(NodeDiff::Leaf)
        } else if old_node.is_diffed_as_list() {
            self.diff_list_nodes(old, new).map(NodeDiff::List)
        } else {
            self.diff_tree_nodes(old, new).map(NodeDiff::Tree)
        };
        if diff.is_none() {
            trace!(%old, %new, "pair rejected");
        }
        diff
    }

    fn diff_leaf_nodes(&mut self, old: NodeId, new: NodeId) -> Option<LeafDiff> {
        let old_node = self.old.node(old);
        let mut linear_diff = None;

        if old_node.can_contain_content() {
            let mut record = ChangeRecord::with_keep(old_node.length as i64);
            let diff = self.diff_content(old, new)?;
            record.record_linear(&diff);
            if record.is_under_threshold(self.config.diff_threshold) {
                return None;
            }
            linear_diff = Some(diff);
        }

        Some(LeafDiff {
            attribute_change: diff_attributes(&old_node.attributes, &self.new.node(new).attributes),
            linear_diff,
        })
    }

    /// Content diff of two content leaves, or `None` once the run deadline
    /// has passed. A differ that hits the deadline mid-way still returns its
    /// coarse result but marks the run as timed out.
    pub(crate) fn diff_content(&mut self, old: NodeId, new: NodeId) -> Option<LinearDiff> {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            self.mark_timed_out();
            return None;
        }
        let diff = linear::diff_units(
            &self.old.resolved_content(old),
            &self.new.resolved_content(new),
            self.deadline,
        );
        if diff.timed_out {
            self.mark_timed_out();
        }
        Some(diff)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::linear::LinearTag;

    fn paragraphs(texts: &[&str]) -> Document {
        let body: Vec<_> = texts
            .iter()
            .map(|text| {
                serde_json::json!({ "type": "paragraph", "shape": "content", "content": [ { "text": text } ] })
            })
            .collect();
        Document::from_json(&serde_json::json!({ "body": body }).to_string()).unwrap()
    }

    fn first(doc: &Document) -> NodeId {
        doc.body_children()[0]
    }

    #[test]
    fn identical_paragraphs() {
        let (old, new) = (paragraphs(&["same"]), paragraphs(&["same"]));
        let config = DiffConfig::default();
        let differ = Differ::new(&old, &new, &config);
        assert!(differ.is_identical(first(&old), first(&new)));
    }

    #[test]
    fn equal_length_different_text_is_not_identical() {
        let (old, new) = (paragraphs(&["abcd"]), paragraphs(&["abce"]));
        let config = DiffConfig::default();
        let differ = Differ::new(&old, &new, &config);
        assert!(!differ.is_identical(first(&old), first(&new)));
    }

    #[test]
    fn identical_modulo_annotation_origin() {
        let old = Document::from_json(
            r#"{ "body": [ { "type": "p", "shape": "content", "content": [
                { "text": "x", "annotations": [ { "type": "bold", "origin": "<b>" } ] } ] } ] }"#,
        )
        .unwrap();
        let new = Document::from_json(
            r#"{ "body": [ { "type": "p", "shape": "content", "content": [
                { "text": "x", "annotations": [ { "type": "bold", "origin": "<strong>" } ] } ] } ] }"#,
        )
        .unwrap();
        let config = DiffConfig::default();
        let differ = Differ::new(&old, &new, &config);
        assert!(differ.is_identical(first(&old), first(&new)));
    }

    #[test]
    fn different_types_are_rejected() {
        let old = paragraphs(&["abc"]);
        let new = Document::from_json(
            r#"{ "body": [ { "type": "heading", "shape": "content", "content": [ { "text": "abc" } ] } ] }"#,
        )
        .unwrap();
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);
        assert!(!differ.is_identical(first(&old), first(&new)));
        assert!(differ.dispatch(first(&old), first(&new)).is_none());
    }

    #[test]
    fn threshold_boundary_is_accepted() {
        // keep 4 - 2 = 2, diff 2 + 2 = 4: 2 < 0.5 * 4 is false.
        let (old, new) = (paragraphs(&["abcd"]), paragraphs(&["abXY"]));
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);
        let Some(NodeDiff::Leaf(leaf)) = differ.dispatch(first(&old), first(&new)) else {
            panic!("expected a leaf diff");
        };
        let linear = leaf.linear_diff.unwrap();
        assert_eq!(linear.ops[0].tag, LinearTag::Equal);
        assert!(leaf.attribute_change.is_none());
    }

    #[test]
    fn under_threshold_is_rejected() {
        // keep 4 - 3 = 1, diff 3 + 3 = 6: 1 < 3.
        let (old, new) = (paragraphs(&["abcd"]), paragraphs(&["aXYZ"]));
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);
        assert!(differ.dispatch(first(&old), first(&new)).is_none());
        assert!(!differ.timed_out());
    }

    #[test]
    fn zero_timeout_rejects_content_diff() {
        let (old, new) = (paragraphs(&["abcd"]), paragraphs(&["abcX"]));
        let config = DiffConfig::with_timeout(Duration::ZERO);
        let mut differ = Differ::new(&old, &new, &config);
        assert!(differ.dispatch(first(&old), first(&new)).is_none());
        assert!(differ.timed_out());
    }

    #[test]
    fn attribute_only_change_on_content_leaf() {
        let old = Document::from_json(
            r#"{ "body": [ { "type": "heading", "shape": "content", "attributes": { "level": 1 },
                "content": [ { "text": "Title" } ] } ] }"#,
        )
        .unwrap();
        let new = Document::from_json(
            r#"{ "body": [ { "type": "heading", "shape": "content", "attributes": { "level": 2 },
                "content": [ { "text": "Title" } ] } ] }"#,
        )
        .unwrap();
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);
        assert!(!differ.is_identical(first(&old), first(&new)));
        let Some(NodeDiff::Leaf(leaf)) = differ.dispatch(first(&old), first(&new)) else {
            panic!("expected a leaf diff");
        };
        assert!(leaf.attribute_change.is_some());
        assert!(leaf.linear_diff.unwrap().is_unchanged());
    }

    #[test]
    fn contentless_leaf_has_no_linear_diff() {
        let old = Document::from_json(
            r#"{ "body": [ { "type": "image", "shape": "leaf", "attributes": { "src": "a.png" } } ] }"#,
        )
        .unwrap();
        let new = Document::from_json(
            r#"{ "body": [ { "type": "image", "shape": "leaf", "attributes": { "src": "b.png" } } ] }"#,
        )
        .unwrap();
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);
        let Some(NodeDiff::Leaf(leaf)) = differ.dispatch(first(&old), first(&new)) else {
            panic!("expected a leaf diff");
        };
        assert!(leaf.linear_diff.is_none());
        assert_eq!(leaf.attribute_change.unwrap().key_changes().len(), 1);
    }
}
