//! Content-level diff of two leaf content runs.
//!
//! Uses the `similar` crate (Myers algorithm) over store-resolved content
//! units, so annotations interned differently in the two documents still
//! compare equal. The raw `similar` ops are normalized: replaces are split
//! into a delete followed by an insert, and adjacent ops with the same tag
//! are merged.

use std::ops::Range;
use std::time::Instant;

use docdiff_model::ResolvedUnit;
use serde::Serialize;
use similar::{Algorithm, DiffTag};

/// Kind of a [`LinearOp`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearTag {
    Equal,
    Delete,
    Insert,
}

/// One run of the content diff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearOp {
    pub tag: LinearTag,
    pub old_range: Range<usize>,
    pub new_range: Range<usize>,
}

impl LinearOp {
    /// Number of content units the op covers on the side it affects.
    pub fn len(&self) -> usize {
        match self.tag {
            LinearTag::Insert => self.new_range.len(),
            LinearTag::Equal | LinearTag::Delete => self.old_range.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The content diff of one leaf pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearDiff {
    pub ops: Vec<LinearOp>,
    /// The underlying differ hit its deadline and returned a coarser result.
    pub timed_out: bool,
}

impl LinearDiff {
    /// `true` if every op is an equal run.
    pub fn is_unchanged(&self) -> bool {
        self.ops.iter().all(|op| op.tag == LinearTag::Equal)
    }

    fn total(&self, tag: LinearTag) -> usize {
        self.ops.iter().filter(|op| op.tag == tag).map(LinearOp::len).sum()
    }

    pub fn inserted(&self) -> usize {
        self.total(LinearTag::Insert)
    }

    pub fn deleted(&self) -> usize {
        self.total(LinearTag::Delete)
    }

    pub fn kept(&self) -> usize {
        self.total(LinearTag::Equal)
    }
}

/// Diff two resolved content runs, giving up on precision at `deadline`.
pub fn diff_units(old: &[ResolvedUnit], new: &[ResolvedUnit], deadline: Option<Instant>) -> LinearDiff {
    let raw = similar::capture_diff_slices_deadline(Algorithm::Myers, old, new, deadline);
    let timed_out = deadline.is_some_and(|deadline| Instant::now() >= deadline);

    let mut ops: Vec<LinearOp> = Vec::with_capacity(raw.len());
    for op in &raw {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => push_merged(&mut ops, LinearTag::Equal, old_range, new_range),
            DiffTag::Delete => push_merged(&mut ops, LinearTag::Delete, old_range, new_range),
            DiffTag::Insert => push_merged(&mut ops, LinearTag::Insert, old_range, new_range),
            DiffTag::Replace => {
                let (old_end, new_start) = (old_range.end, new_range.start);
                push_merged(&mut ops, LinearTag::Delete, old_range, new_start..new_start);
                push_merged(&mut ops, LinearTag::Insert, old_end..old_end, new_range);
            }
        }
    }

    LinearDiff { ops, timed_out }
}

fn push_merged(ops: &mut Vec<LinearOp>, tag: LinearTag, old_range: Range<usize>, new_range: Range<usize>) {
    if old_range.is_empty() && new_range.is_empty() {
        return;
    }
    if let Some(last) = ops.last_mut() {
        if last.tag == tag && last.old_range.end == old_range.start && last.new_range.end == new_range.start {
            last.old_range.end = old_range.end;
            last.new_range.end = new_range.end;
            return;
        }
    }
    ops.push(LinearOp {
        tag,
        old_range,
        new_range,
    });
}
