//! Document model for docdiff.
//!
//! A document is a tree of typed nodes carrying attributes and, at
//! content-bearing leaves, runs of content units. The diff engine consumes
//! documents through this crate only.
//!
//! # Key Types
//!
//! - [`Document`] -- Node arena, content buffer, annotation store and internal list
//! - [`Node`] / [`NodeShape`] -- Tagged node variants
//! - [`DiffCapabilities`] -- Leaf / list / content / comparability queries
//! - [`ContentUnit`] / [`ResolvedUnit`] -- Raw and store-independent content
//! - [`InternalList`] / [`ReferenceGroup`] -- Out-of-flow referenced items
//! - [`DocumentSource`] -- Serializable input format

pub mod content;
pub mod document;
pub mod error;
pub mod internal_list;
pub mod node;
pub mod source;

pub use content::{Annotation, AnnotationRef, ContentStore, ContentUnit, InlineNode, ResolvedUnit};
pub use document::{Document, LinearItem};
pub use error::{ModelError, ModelResult};
pub use internal_list::{FrozenIndices, InternalList, ReferenceGroup, ReferenceKey};
pub use node::{Attributes, DiffCapabilities, Node, NodeId, NodeShape};
pub use source::{DocumentSource, InlineSource, InternalItemSource, InternalListSource, NodeSource, RunSource, ShapeSource};
