//! Whole-run orchestration.
//!
//! [`VisualDiff`] clones both inputs into standalone snapshots, freezes
//! reference numbering and marks them read-only for the duration of the
//! run, diffs the top-level children and the internal list, and then
//! restores the snapshots. Restoration is tied to a guard, so it also
//! happens when the run unwinds.

use std::collections::BTreeMap;

use docdiff_model::{Document, FrozenIndices, NodeId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DiffConfig;
use crate::correspondence::{CorrespondenceMap, Move};
use crate::differ::Differ;
use crate::error::{EngineError, EngineResult};
use crate::list::ListDiffInfo;

/// The complete diff of two documents.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDiff {
    /// Diff of the top-level children, internal list excluded.
    pub doc_diff: CorrespondenceMap,
    /// Changed internal list groups by name.
    pub internal_list_diff: BTreeMap<String, ListDiffInfo>,
    pub timed_out: bool,
}

/// Counts over the top-level correspondence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub inserted: usize,
    pub removed: usize,
    pub moved: usize,
    pub internal_groups_changed: usize,
}

impl DiffSummary {
    pub fn is_unchanged(&self) -> bool {
        self.changed == 0
            && self.inserted == 0
            && self.removed == 0
            && self.moved == 0
            && self.internal_groups_changed == 0
    }
}

impl DocumentDiff {
    pub fn summary(&self) -> DiffSummary {
        let map = &self.doc_diff;
        DiffSummary {
            unchanged: map.old_to_new.iter().filter(|link| link.is_unchanged()).count(),
            changed: map.old_to_new.iter().filter(|link| link.is_changed()).count(),
            inserted: map.insert.len(),
            removed: map.remove.len(),
            moved: map.moves.iter().filter(|m| **m != Move::Unmoved).count(),
            internal_groups_changed: self.internal_list_diff.len(),
        }
    }
}

/// Frozen, read-only state of the two snapshots for one run.
struct SnapshotGuard<'a> {
    old: &'a mut Document,
    new: &'a mut Document,
    frozen: Option<(FrozenIndices, FrozenIndices)>,
}

impl<'a> SnapshotGuard<'a> {
    fn acquire(old: &'a mut Document, new: &'a mut Document) -> Self {
        let frozen = (old.freeze_internal_list_indices(), new.freeze_internal_list_indices());
        old.set_read_only(true);
        new.set_read_only(true);
        Self {
            old,
            new,
            frozen: Some(frozen),
        }
    }

    fn documents(&self) -> (&Document, &Document) {
        (self.old, self.new)
    }
}

impl Drop for SnapshotGuard<'_> {
    fn drop(&mut self) {
        if let Some((old, new)) = self.frozen.take() {
            self.old.restore_internal_list_indices(old);
            self.new.restore_internal_list_indices(new);
        }
        self.old.set_read_only(false);
        self.new.set_read_only(false);
    }
}

/// A finished diff run together with the snapshots its node ids refer to.
#[derive(Debug)]
pub struct VisualDiff {
    old: Document,
    new: Document,
    diff: DocumentDiff,
}

impl VisualDiff {
    /// Diff two whole documents.
    pub fn new(old: &Document, new: &Document, config: &DiffConfig) -> EngineResult<Self> {
        Self::between_subtrees(old, None, new, None, config)
    }

    /// Diff two subtrees, or whole documents where the node is `None`. Each
    /// subtree becomes the sole body child of its snapshot.
    pub fn between_subtrees(
        old: &Document,
        old_node: Option<NodeId>,
        new: &Document,
        new_node: Option<NodeId>,
        config: &DiffConfig,
    ) -> EngineResult<Self> {
        let mut old_snapshot = snapshot(old, old_node, "old")?;
        let mut new_snapshot = snapshot(new, new_node, "new")?;

        let diff = {
            let guard = SnapshotGuard::acquire(&mut old_snapshot, &mut new_snapshot);
            let (old_doc, new_doc) = guard.documents();
            let mut differ = Differ::new(old_doc, new_doc, config);

            let doc_diff = differ.diff_list(&old_doc.body_children(), &new_doc.body_children());
            let internal_list_diff = differ.diff_internal_list();
            let timed_out = differ.timed_out();
            DocumentDiff {
                doc_diff,
                internal_list_diff,
                timed_out,
            }
        };

        if diff.timed_out {
            warn!(timeout = ?config.timeout, "diff timed out; result is coarser than usual");
        }
        debug!(summary = ?diff.summary(), "diff complete");

        Ok(Self {
            old: old_snapshot,
            new: new_snapshot,
            diff,
        })
    }

    pub fn diff(&self) -> &DocumentDiff {
        &self.diff
    }

    pub fn into_diff(self) -> DocumentDiff {
        self.diff
    }

    pub fn timed_out(&self) -> bool {
        self.diff.timed_out
    }

    pub fn summary(&self) -> DiffSummary {
        self.diff.summary()
    }

    /// The old snapshot; node ids in the diff's old side index into it.
    pub fn old_document(&self) -> &Document {
        &self.old
    }

    /// The new snapshot; node ids in the diff's new side index into it.
    pub fn new_document(&self) -> &Document {
        &self.new
    }
}

fn snapshot(doc: &Document, node: Option<NodeId>, side: &'static str) -> EngineResult<Document> {
    if let Some(id) = node {
        if doc.get(id).is_none() {
            return Err(EngineError::UnknownNode(id, side));
        }
    }
    Ok(doc.clone_subtree(node)?)
}
