//! Tree alignment for docdiff.
//!
//! Builds post-order views of two ordered trees and computes the minimal
//! sequence of node-level edits (remove, insert, change) between them under
//! unit cost, using the Zhang–Shasha ordered tree edit distance.
//!
//! # Key Types
//!
//! - [`OrderedTree`] -- Post-order view of a tree ("deepest first, then document order")
//! - [`align`] / [`Alignment`] / [`EditOp`] -- Edit script and node correspondence

pub mod distance;
pub mod error;
pub mod tree;

pub use distance::{align, Alignment, EditOp};
pub use error::{AlignError, AlignResult};
pub use tree::{OrderedNode, OrderedTree};
