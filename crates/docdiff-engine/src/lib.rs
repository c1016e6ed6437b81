//! Structural diff engine for docdiff.
//!
//! Compares two revisions of a structured document and reports which
//! top-level nodes are unchanged, changed, inserted, removed or moved, with
//! nested list, tree and content diffs for changed pairs and a separate
//! per-group diff of the internal list.
//!
//! # Key Types
//!
//! - [`VisualDiff`] / [`DocumentDiff`] -- Whole-run entry point and its result
//! - [`Differ`] -- Per-run state: node comparison, dispatch, sequence diff
//! - [`CorrespondenceMap`] / [`Link`] / [`Move`] -- Diff of two ordered sequences
//! - [`NodeDiff`] -- Leaf, list, tree or list-item diff of a corresponding pair
//! - [`ListDiffInfo`] -- Index-ordered, renderable list diff
//! - [`DiffConfig`] -- Timeouts and acceptance threshold

pub mod attributes;
pub mod change_record;
pub mod config;
pub mod correspondence;
pub mod diff;
pub mod differ;
pub mod error;
pub mod flatten;
pub mod internal_list;
pub mod linear;
pub mod list;
pub mod moves;
mod tree;
pub mod visual_diff;

pub use attributes::{diff_attributes, AttributeChange, KeyChange};
pub use change_record::ChangeRecord;
pub use config::DiffConfig;
pub use correspondence::{CorrespondenceMap, Link, Move};
pub use diff::{LeafDiff, ListItemChange, ListNodeDiff, NodeDiff, PairDiff, TreeNodeDiff};
pub use differ::Differ;
pub use error::{EngineError, EngineResult};
pub use flatten::{flatten_list, FlatItem, FlatList};
pub use linear::{diff_units, LinearDiff, LinearOp, LinearTag};
pub use list::{list_diff_info, ItemDiff, ListDiffInfo, ListDiffItem, ListIndex};
pub use moves::{compute_moves, longest_increasing_subsequence};
pub use visual_diff::{DiffSummary, DocumentDiff, VisualDiff};
