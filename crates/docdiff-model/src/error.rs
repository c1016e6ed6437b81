use thiserror::Error;

use crate::node::NodeId;

/// Errors produced by document model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A mutation was attempted while the document is read-only.
    #[error("document is read-only")]
    ReadOnly,

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// The source tree violates a structural rule (e.g. a list containing
    /// something other than list items).
    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    /// An inline reference names an internal item that does not exist.
    #[error("unknown reference: group {group:?}, key {key:?}")]
    UnknownReference { group: String, key: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for model results.
pub type ModelResult<T> = Result<T, ModelError>;
