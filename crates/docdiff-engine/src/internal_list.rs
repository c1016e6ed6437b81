//! Diff of the internal list, group by group.
//!
//! Groups present in both documents are diffed as ordered sequences of
//! their items in display order. Groups present on one side only are
//! reported item by item as inserted or removed.

use std::collections::BTreeMap;

use docdiff_model::{Document, NodeId, ReferenceGroup};
use tracing::debug;

use crate::differ::Differ;
use crate::list::{list_diff_info, ItemDiff, ListDiffInfo, ListDiffItem, ListIndex};

/// Items of a group in display order, skipping empty slots.
fn group_items(doc: &Document, group: &ReferenceGroup) -> (Vec<NodeId>, Vec<ListIndex>) {
    let items = doc.internal_items();
    group
        .ordered_items()
        .filter_map(|(position, item)| {
            let node = items.get(item).copied();
            debug_assert!(node.is_some(), "index order names missing internal item {item}");
            node.map(|node| (node, ListIndex::internal(position, item)))
        })
        .unzip()
}

/// Every item of a one-sided group, tagged with `diff`.
fn whole_group(group: &ReferenceGroup, diff: ItemDiff) -> ListDiffInfo {
    ListDiffInfo {
        items: group
            .ordered_items()
            .map(|(position, item)| ListDiffItem {
                index: ListIndex::internal(position, item),
                diff: diff.clone(),
                source: None,
            })
            .collect(),
        changes: true,
        moves: Vec::new(),
    }
}

impl Differ<'_> {
    /// Per-group diff of the two internal lists. Unchanged groups are omitted.
    pub fn diff_internal_list(&mut self) -> BTreeMap<String, ListDiffInfo> {
        let (old_doc, new_doc) = (self.old, self.new);
        let old_groups = old_doc.internal_list().groups();
        let new_groups = new_doc.internal_list().groups();
        let mut result = BTreeMap::new();

        for (name, new_group) in new_groups {
            let Some(old_group) = old_groups.get(name) else {
                result.insert(name.clone(), whole_group(new_group, ItemDiff::Inserted));
                continue;
            };

            let (old_nodes, old_indices) = group_items(old_doc, old_group);
            let (new_nodes, new_indices) = group_items(new_doc, new_group);
            let map = self.diff_list(&old_nodes, &new_nodes);
            if let Some(info) = list_diff_info(map, &old_indices, &new_indices, true) {
                result.insert(name.clone(), info);
            }
        }

        for (name, old_group) in old_groups {
            if !new_groups.contains_key(name) {
                result.insert(name.clone(), whole_group(old_group, ItemDiff::Removed));
            }
        }

        debug!(changed_groups = result.len(), "internal list diff");
        result
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::config::DiffConfig;

    fn reference(group: &str, key: &str) -> Value {
        json!({ "inline": { "type": "reference", "reference": { "group": group, "key": key } } })
    }

    fn note(group: &str, key: &str, text: &str) -> Value {
        json!({ "group": group, "key": key, "children": [
            { "type": "paragraph", "shape": "content", "content": [ { "text": text } ] } ] })
    }

    fn doc(refs: Vec<Value>, notes: Vec<Value>) -> Document {
        let mut content = vec![json!({ "text": "Body " })];
        content.extend(refs);
        Document::from_json(
            &json!({
                "body": [ { "type": "paragraph", "shape": "content", "content": content } ],
                "internalList": { "items": notes }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn unchanged_groups_are_omitted() {
        let old = doc(vec![reference("", "a")], vec![note("", "a", "Footnote")]);
        let new = doc(vec![reference("", "a")], vec![note("", "a", "Footnote")]);
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);
        assert!(differ.diff_internal_list().is_empty());
    }

    #[test]
    fn inserted_group_marks_every_item() {
        let old = doc(vec![reference("", "a")], vec![note("", "a", "Footnote")]);
        let new = doc(
            vec![reference("", "a"), reference("notes", "x"), reference("notes", "y")],
            vec![note("", "a", "Footnote"), note("notes", "x", "One"), note("notes", "y", "Two")],
        );
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);

        let diff = differ.diff_internal_list();
        let notes = &diff["notes"];
        assert!(notes.changes);
        assert_eq!(notes.items.len(), 2);
        assert!(notes.items.iter().all(|item| item.diff == ItemDiff::Inserted));
        assert_eq!(notes.items[0].index, ListIndex::internal(0, 1));
        assert!(!diff.contains_key(""));
    }

    #[test]
    fn removed_group_marks_every_item() {
        let old = doc(vec![reference("notes", "x")], vec![note("notes", "x", "One")]);
        let new = doc(vec![], vec![]);
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);

        let diff = differ.diff_internal_list();
        assert_eq!(diff["notes"].items.len(), 1);
        assert_eq!(diff["notes"].items[0].diff, ItemDiff::Removed);
    }

    #[test]
    fn edited_item_is_changed() {
        let old = doc(vec![reference("", "a")], vec![note("", "a", "A footnote text")]);
        let new = doc(vec![reference("", "a")], vec![note("", "a", "A footnote text!")]);
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);

        let diff = differ.diff_internal_list();
        let group = &diff[""];
        assert_eq!(group.items.len(), 1);
        assert!(matches!(group.items[0].diff, ItemDiff::Changed(_)));
        assert_eq!(group.items[0].index.node_index, Some(0));
    }

    #[test]
    fn replaced_items_are_reported_even_without_correspondence() {
        let old = doc(vec![reference("", "a")], vec![note("", "a", "Completely")]);
        let new = doc(vec![reference("", "b")], vec![note("", "b", "zzzzzzzzzzzzzzz")]);
        let config = DiffConfig::default();
        let mut differ = Differ::new(&old, &new, &config);

        let diff = differ.diff_internal_list();
        let group = &diff[""];
        assert_eq!(group.removed(), 1);
        assert_eq!(group.inserted(), 1);
        assert_eq!(group.items[0].diff, ItemDiff::Removed);
    }
}
