//! Error types for the diff engine.
//!
//! Rejected node pairs and timeouts are ordinary outcomes of a run and are
//! reported in the result, not here.

use docdiff_model::{ModelError, NodeId};

/// Errors that prevent a diff run from starting.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A subtree root passed to the engine does not exist.
    #[error("unknown node {0} in {1} document")]
    UnknownNode(NodeId, &'static str),

    /// Snapshot preparation failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
