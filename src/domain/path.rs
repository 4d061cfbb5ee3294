//! Index-path addressing: a node is located by the child indices leading to
//! it from the root.

use std::fmt;
use std::ops::Deref;

use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeId, NodeRef, Tree};
use crate::domain::error::{CallbackResult, TreeError, TreeResult};

/// Root-relative sequence of child indices. Empty for the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th child of the node at `self`.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Path of the parent, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl Deref for NodePath {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(segments: Vec<usize>) -> Self {
        Self(segments)
    }
}

impl From<&[usize]> for NodePath {
    fn from(segments: &[usize]) -> Self {
        Self(segments.to_vec())
    }
}

/// `/` for the root, `/0/2` for the third child of the first child.
impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Follows `path` from the root. `None` if any index is out of range.
#[instrument(level = "trace", skip(tree))]
pub fn get_node_at_path(tree: &Tree, path: &NodePath) -> Option<NodeId> {
    let mut current = tree.root();
    for &index in path.iter() {
        current = current.child(index)?;
    }
    Some(current.id())
}

/// Overwrites the node at `path` with `replacement`, re-parenting it.
/// An empty path is a no-op: the root cannot be replaced this way.
#[instrument(level = "trace", skip(tree, replacement))]
pub fn replace_node_at_path(tree: &mut Tree, replacement: Tree, path: &NodePath) -> TreeResult<()> {
    if path.is_empty() {
        debug!("replace at root path ignored");
        return Ok(());
    }
    let target =
        get_node_at_path(tree, path).ok_or_else(|| TreeError::PathOutOfRange(path.clone()))?;
    tree.replace_subtree(target, replacement)?;
    Ok(())
}

/// Removes the node at `path` with its subtree. An empty path is a no-op.
#[instrument(level = "trace", skip(tree))]
pub fn remove_node_at_path(tree: &mut Tree, path: &NodePath) -> TreeResult<()> {
    if path.is_empty() {
        debug!("remove at root path ignored");
        return Ok(());
    }
    let target =
        get_node_at_path(tree, path).ok_or_else(|| TreeError::PathOutOfRange(path.clone()))?;
    tree.remove_subtree(target)?;
    Ok(())
}

/// Pre-order scan returning matching nodes and their paths as parallel vectors.
///
/// A predicate failure on one node is logged and that node is skipped; the
/// scan continues with the rest of the tree.
#[instrument(level = "debug", skip(tree, predicate))]
pub fn collect_nodes_with_paths<P>(tree: &Tree, mut predicate: P) -> (Vec<NodeId>, Vec<NodePath>)
where
    P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
{
    let mut nodes = Vec::new();
    let mut paths = Vec::new();
    for (node, path) in tree.iter_with_paths() {
        match predicate(node) {
            Ok(true) => {
                nodes.push(node.id());
                paths.push(path);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(node = %node.name(), %path, error = %e, "predicate failed, skipped")
            }
        }
    }
    debug!(matches = nodes.len(), "collected nodes");
    (nodes, paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_path_display() {
        assert_eq!(NodePath::root().to_string(), "/");
        assert_eq!(NodePath::from(vec![0, 2]).to_string(), "/0/2");
    }

    #[test]
    fn test_node_path_parent_and_child() {
        let path = NodePath::root().child(1).child(3);
        assert_eq!(path.segments(), &[1, 3]);
        assert_eq!(path.parent(), Some(NodePath::from(vec![1])));
        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(path.last(), Some(&3));
    }
}
