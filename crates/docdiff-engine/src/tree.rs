//! General branch diff by tree alignment.
//!
//! Both subtrees are aligned by `docdiff-align` under a label equality that
//! treats content leaves as equal only when identical. The edit script is
//! then scored: changed content leaves are diffed by content and charged
//! per run, content gained or lost is charged in full, and content-free
//! nodes cost nothing. The pair is rejected when too little old content
//! survives.

use std::collections::BTreeMap;

use docdiff_align::{align, AlignError, EditOp, OrderedTree};
use docdiff_model::{DiffCapabilities, NodeId};
use tracing::debug;

use crate::attributes::diff_attributes;
use crate::change_record::ChangeRecord;
use crate::diff::{PairDiff, TreeNodeDiff};
use crate::differ::Differ;

/// A tree alignment scored against the threshold tally.
struct ScoredTree {
    script: Vec<EditOp>,
    old_ordered: Vec<NodeId>,
    new_ordered: Vec<NodeId>,
    old_to_new: Vec<Option<usize>>,
    new_to_old: Vec<Option<usize>>,
    record: ChangeRecord,
    diff_info: BTreeMap<usize, PairDiff>,
}

impl Differ<'_> {
    /// Diff two branch nodes by tree alignment.
    pub(crate) fn diff_tree_nodes(&mut self, old: NodeId, new: NodeId) -> Option<TreeNodeDiff> {
        let scored = self.score_tree_pair(old, new)?;
        let record = scored.record;
        if record.is_under_threshold(self.config.diff_threshold) {
            debug!(
                keep = record.keep_length,
                diff = record.diff_length,
                %old,
                %new,
                "tree pair under threshold"
            );
            return None;
        }

        Some(TreeNodeDiff {
            script: scored.script,
            diff_info: scored.diff_info,
            old_ordered: scored.old_ordered,
            new_ordered: scored.new_ordered,
            correspondence_old_to_new: scored.old_to_new,
            correspondence_new_to_old: scored.new_to_old,
        })
    }

    /// Align two branch nodes and charge every edit. `None` if the alignment
    /// ran out of time.
    fn score_tree_pair(&mut self, old: NodeId, new: NodeId) -> Option<ScoredTree> {
        let (old_doc, new_doc) = (self.old, self.new);
        let old_tree = OrderedTree::build(old, |id| old_doc.children(*id).to_vec());
        let new_tree = OrderedTree::build(new, |id| new_doc.children(*id).to_vec());

        let alignment = match align(
            &old_tree,
            &new_tree,
            |a, b| self.is_tree_equal(*a, *b),
            Some(self.config.tree_align_timeout),
        ) {
            Ok(alignment) => alignment,
            Err(AlignError::TimedOut { elapsed }) => {
                debug!(?elapsed, %old, %new, "tree alignment timed out");
                self.mark_timed_out();
                return None;
            }
        };

        let old_ordered: Vec<NodeId> = old_tree.items().copied().collect();
        let new_ordered: Vec<NodeId> = new_tree.items().copied().collect();

        // Old content length: the outer length minus two markers per descendant.
        let markers = 2 * (old_ordered.len() as i64 - 1);
        let mut record = ChangeRecord::with_keep(old_doc.node(old).length as i64 - markers);
        let mut diff_info = BTreeMap::new();

        for (index, op) in alignment.script.iter().enumerate() {
            match (op.old, op.new) {
                (Some(x), Some(y)) => {
                    let (old_id, new_id) = (old_ordered[x], new_ordered[y]);
                    let (old_node, new_node) = (old_doc.node(old_id), new_doc.node(new_id));

                    if !old_node.can_contain_content() && !new_node.can_contain_content() {
                        if old_node.is_diff_comparable(new_node) {
                            diff_info.insert(
                                index,
                                PairDiff {
                                    attribute_change: diff_attributes(&old_node.attributes, &new_node.attributes),
                                    linear_diff: None,
                                },
                            );
                        }
                    } else if !new_node.can_contain_content() {
                        record.record(old_node.length, true);
                    } else if !old_node.can_contain_content() {
                        record.record(new_node.length, false);
                    } else {
                        let mut linear_diff = None;
                        if old_node.is_diff_comparable(new_node) {
                            linear_diff = self.diff_content(old_id, new_id);
                            diff_info.insert(
                                index,
                                PairDiff {
                                    attribute_change: diff_attributes(&old_node.attributes, &new_node.attributes),
                                    linear_diff: linear_diff.clone(),
                                },
                            );
                        }
                        match &linear_diff {
                            Some(diff) => record.record_linear(diff),
                            None => {
                                record.record(old_node.length, true);
                                record.record(new_node.length, false);
                            }
                        }
                    }
                }
                (Some(x), None) => {
                    let node = old_doc.node(old_ordered[x]);
                    if node.can_contain_content() {
                        record.record(node.length, true);
                    }
                }
                (None, Some(y)) => {
                    let node = new_doc.node(new_ordered[y]);
                    if node.can_contain_content() {
                        record.record(node.length, false);
                    }
                }
                (None, None) => {}
            }
        }

        Some(ScoredTree {
            script: alignment.script,
            old_ordered,
            new_ordered,
            old_to_new: alignment.old_to_new,
            new_to_old: alignment.new_to_old,
            record,
            diff_info,
        })
    }

    /// Label equality for tree alignment: content leaves must be identical,
    /// other nodes need the same type, shape and attributes.
    fn is_tree_equal(&self, old: NodeId, new: NodeId) -> bool {
        let (old_node, new_node) = (self.old.node(old), self.new.node(new));
        if old_node.can_contain_content() || new_node.can_contain_content() {
            return self.is_identical(old, new);
        }
        old_node.is_diff_comparable(new_node) && old_node.attributes == new_node.attributes
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use docdiff_model::Document;
    use serde_json::json;

    use super::*;
    use crate::config::DiffConfig;
    use crate::diff::NodeDiff;

    fn doc(body: serde_json::Value) -> Document {
        Document::from_json(&json!({ "body": body }).to_string()).unwrap()
    }

    fn para(text: &str) -> serde_json::Value {
        json!({ "type": "paragraph", "shape": "content", "content": [ { "text": text } ] })
    }

    fn section(attributes: serde_json::Value, children: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "type": "section", "attributes": attributes, "children": children })
    }

    fn tree_diff(old: &Document, new: &Document, config: &DiffConfig) -> (Option<TreeNodeDiff>, bool) {
        let mut differ = Differ::new(old, new, config);
        let diff = match differ.dispatch(old.body_children()[0], new.body_children()[0]) {
            Some(NodeDiff::Tree(tree)) => Some(tree),
            Some(other) => panic!("expected a tree diff, got {other:?}"),
            None => None,
        };
        (diff, differ.timed_out())
    }

    #[test]
    fn edited_paragraph_inside_section() {
        let old = doc(json!([section(json!({}), vec![para("Intro text"), para("Body text here")])]));
        let new = doc(json!([section(json!({}), vec![para("Intro text"), para("Body text there")])]));
        let config = DiffConfig::default();

        let (diff, timed_out) = tree_diff(&old, &new, &config);
        let diff = diff.unwrap();
        assert!(!timed_out);
        assert_eq!(diff.old_ordered.len(), 3);
        assert_eq!(diff.script.len(), 1);
        assert!(diff.script[0].is_change());
        let pair = &diff.diff_info[&0];
        assert!(pair.attribute_change.is_none());
        assert_eq!(pair.linear_diff.as_ref().unwrap().inserted(), 1);
        assert_eq!(diff.correspondence_old_to_new, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(diff.correspondence_new_to_old, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn section_attribute_change() {
        let old = doc(json!([section(json!({ "id": "a" }), vec![para("Same")])]));
        let new = doc(json!([section(json!({ "id": "b" }), vec![para("Same")])]));
        let config = DiffConfig::default();

        let (diff, _) = tree_diff(&old, &new, &config);
        let diff = diff.unwrap();
        assert_eq!(diff.script.len(), 1);
        let change = diff.diff_info[&0].attribute_change.as_ref().unwrap();
        assert_eq!(change.new_attributes["id"], json!("b"));
        assert!(diff.diff_info[&0].linear_diff.is_none());
    }

    #[test]
    fn inserted_paragraph_is_charged() {
        let old = doc(json!([section(json!({}), vec![para("Long enough paragraph")])]));
        let new = doc(json!([section(json!({}), vec![para("Long enough paragraph"), para("tiny")])]));
        let config = DiffConfig::default();

        let (diff, _) = tree_diff(&old, &new, &config);
        let diff = diff.unwrap();
        assert!(diff.script.iter().any(|op| op.is_insert()));
    }

    #[test]
    fn replaced_content_is_rejected() {
        let old = doc(json!([section(json!({}), vec![para("Original words")])]));
        let new = doc(json!([section(json!({}), vec![para("zzzzzzzzzzzzzzzzzzzzz"), para("qqqqqqqq")])]));
        let config = DiffConfig::default();

        let (diff, timed_out) = tree_diff(&old, &new, &config);
        assert!(diff.is_none());
        assert!(!timed_out);
    }

    #[test]
    fn zero_align_budget_times_out() {
        let old = doc(json!([section(json!({}), vec![para("a")])]));
        let new = doc(json!([section(json!({}), vec![para("b")])]));
        let config = DiffConfig {
            tree_align_timeout: Duration::ZERO,
            ..Default::default()
        };

        let (diff, timed_out) = tree_diff(&old, &new, &config);
        assert!(diff.is_none());
        assert!(timed_out);
    }

    fn image() -> serde_json::Value {
        json!({ "type": "image", "shape": "leaf" })
    }

    fn score(old: &Document, new: &Document, config: &DiffConfig) -> (Option<ScoredTree>, bool) {
        let mut differ = Differ::new(old, new, config);
        let scored = differ.score_tree_pair(old.body_children()[0], new.body_children()[0]);
        (scored, differ.timed_out())
    }

    #[test]
    fn gained_content_charges_new_length() {
        let old = doc(json!([section(json!({}), vec![para("Keep this text"), image()])]));
        let new = doc(json!([section(json!({}), vec![para("Keep this text"), para("pic")])]));
        let config = DiffConfig::default();

        let (scored, _) = score(&old, &new, &config);
        let scored = scored.unwrap();
        assert_eq!(scored.script, vec![EditOp { old: Some(1), new: Some(1) }]);
        assert_eq!(
            scored.record,
            ChangeRecord {
                keep_length: 14,
                diff_length: 3,
                remove_length: 0,
                insert_length: 3,
            }
        );
        assert!(scored.diff_info.is_empty());
        assert!(tree_diff(&old, &new, &config).0.is_some());
    }

    #[test]
    fn lost_content_charges_old_length() {
        let old = doc(json!([section(json!({}), vec![para("Keep this text"), para("pic")])]));
        let new = doc(json!([section(json!({}), vec![para("Keep this text"), image()])]));
        let config = DiffConfig::default();

        let (scored, _) = score(&old, &new, &config);
        let record = scored.unwrap().record;
        assert_eq!(record.remove_length, 3);
        assert_eq!(record.insert_length, 0);
        assert_eq!(record.keep_length, 14);
    }

    #[test]
    fn failed_content_diff_charges_both_lengths() {
        let intro = "A long introduction that stays the same";
        let old = doc(json!([section(json!({}), vec![para(intro), para("ab")])]));
        let new = doc(json!([section(json!({}), vec![para(intro), para("ac")])]));
        let config = DiffConfig::with_timeout(Duration::ZERO);

        let (scored, timed_out) = score(&old, &new, &config);
        let scored = scored.unwrap();
        assert!(timed_out);
        assert_eq!(
            scored.record,
            ChangeRecord {
                keep_length: 39,
                diff_length: 4,
                remove_length: 2,
                insert_length: 2,
            }
        );
        let pair = scored.diff_info.values().next().unwrap();
        assert!(pair.linear_diff.is_none());

        let (diff, timed_out) = tree_diff(&old, &new, &config);
        assert!(diff.is_some());
        assert!(timed_out);
    }

    #[test]
    fn content_free_singletons_are_free() {
        let old = doc(json!([section(json!({}), vec![para("Keep this text"), image()])]));
        let new = doc(json!([section(json!({}), vec![para("Keep this text")])]));
        let config = DiffConfig::default();

        let (removed, _) = score(&old, &new, &config);
        let removed = removed.unwrap();
        assert_eq!(removed.script, vec![EditOp { old: Some(1), new: None }]);
        assert_eq!(removed.record, ChangeRecord::with_keep(14));

        let (inserted, _) = score(&new, &old, &config);
        let inserted = inserted.unwrap();
        assert_eq!(inserted.script, vec![EditOp { old: None, new: Some(1) }]);
        assert_eq!(inserted.record, ChangeRecord::with_keep(14));
        assert_eq!(inserted.new_to_old, vec![Some(0), None, Some(1)]);
    }
}
