//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;
use crate::domain::path::NodePath;

/// Error returned by caller-supplied predicates, transforms, reducers and visitors.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for caller-supplied callables.
pub type CallbackResult<T> = Result<T, CallbackError>;

/// Domain errors represent structural violations on a tree.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("path out of range: {0}")]
    PathOutOfRange(NodePath),

    #[error("the root node cannot be removed")]
    RootRemoval,

    #[error("visitor failed at '{name}' ({path}): {source}")]
    VisitorFailed {
        name: String,
        path: NodePath,
        #[source]
        source: CallbackError,
    },
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
