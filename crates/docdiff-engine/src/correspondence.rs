//! Correspondence maps between two ordered sequences.

use serde::Serialize;

use crate::diff::NodeDiff;

/// Where one index of a sequence went in the other sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Link<D> {
    /// No counterpart: removed (old side) or inserted (new side).
    Absent,
    /// Structurally identical counterpart.
    Unchanged { target: usize },
    /// Corresponding but modified counterpart. Old-side links carry the
    /// nested diff; new-side links carry `()`.
    Changed { target: usize, diff: D },
}

impl<D> Link<D> {
    pub fn target(&self) -> Option<usize> {
        match self {
            Link::Absent => None,
            Link::Unchanged { target } | Link::Changed { target, .. } => Some(*target),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Link::Absent)
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Link::Unchanged { .. })
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Link::Changed { .. })
    }

    pub fn diff(&self) -> Option<&D> {
        match self {
            Link::Changed { diff, .. } => Some(diff),
            _ => None,
        }
    }
}

/// Per-new-index move classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    #[default]
    Unmoved,
    Up,
    Down,
}

/// The diff of two ordered sequences.
///
/// # Invariants
///
/// - `old_to_new[i]` targets `j` exactly when `new_to_old[j]` targets `i`,
///   and both links are of the same kind.
/// - An old index is either linked or listed in `remove`, never both; the
///   same holds for new indices and `insert`.
/// - `moves` is empty when nothing corresponds, otherwise it has one entry
///   per new index.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrespondenceMap {
    pub old_to_new: Vec<Link<Box<NodeDiff>>>,
    pub new_to_old: Vec<Link<()>>,
    pub remove: Vec<usize>,
    pub insert: Vec<usize>,
    pub moves: Vec<Move>,
}

impl CorrespondenceMap {
    /// An empty map over sequences of the given lengths.
    pub fn new(old_len: usize, new_len: usize) -> Self {
        Self {
            old_to_new: std::iter::repeat_with(|| Link::Absent).take(old_len).collect(),
            new_to_old: vec![Link::Absent; new_len],
            ..Default::default()
        }
    }

    pub fn link_unchanged(&mut self, old: usize, new: usize) {
        self.old_to_new[old] = Link::Unchanged { target: new };
        self.new_to_old[new] = Link::Unchanged { target: old };
    }

    pub fn link_changed(&mut self, old: usize, new: usize, diff: NodeDiff) {
        self.old_to_new[old] = Link::Changed {
            target: new,
            diff: Box::new(diff),
        };
        self.new_to_old[new] = Link::Changed {
            target: old,
            diff: (),
        };
    }

    /// `(old, new)` index pairs that correspond, in old order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.old_to_new
            .iter()
            .enumerate()
            .filter_map(|(old, link)| link.target().map(|new| (old, new)))
    }

    pub fn has_correspondence(&self) -> bool {
        self.new_to_old.iter().any(|link| !link.is_absent())
    }

    /// Old index for each new index, the input of move detection.
    pub fn new_to_old_targets(&self) -> Vec<Option<usize>> {
        self.new_to_old.iter().map(Link::target).collect()
    }

    /// `true` if the sequences differ in any way: removals, insertions,
    /// changed pairs or moves.
    pub fn has_changes(&self) -> bool {
        !self.remove.is_empty()
            || !self.insert.is_empty()
            || self.old_to_new.iter().any(Link::is_changed)
            || self.moves.iter().any(|m| *m != Move::Unmoved)
    }
}
