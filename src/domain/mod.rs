//! Domain layer: the semantic tree and its structural primitives
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod display;
pub mod entities;
pub mod error;
pub mod path;
pub mod traversal;

pub use arena::{CloneDepth, NodeId, NodeRef, Tree};
pub use display::ToTermTree;
pub use entities::*;
pub use error::{CallbackError, CallbackResult, TreeError, TreeResult};
pub use path::{
    collect_nodes_with_paths, get_node_at_path, remove_node_at_path, replace_node_at_path,
    NodePath,
};
pub use traversal::{
    count_nodes, depth, traverse, traverse_from, TraversalContext, TraversalOrder, Visitor,
};
