use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Attribute, NodeData, NodeKind, Primitive, TEXT_NODE_NAME};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::path::NodePath;

/// Handle of a node inside its [`Tree`]. Only meaningful for the tree that issued it.
pub type NodeId = Index;

/// Depth of [`Tree::clone_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneDepth {
    /// Scalar fields only: no attributes, no children
    Shallow,
    /// Attributes by value and all descendants, re-parented to the copy
    Deep,
}

/// Arena slot: payload plus links.
#[derive(Debug, Clone)]
pub(crate) struct TreeNode {
    data: NodeData,
    /// Index of parent node in the arena, None for the root
    parent: Option<NodeId>,
    /// None until the first child is attached (containers start with Some(empty))
    children: Option<Vec<NodeId>>,
}

/// Arena-based tree with exactly one root.
///
/// Parent links are arena handles, never owning references. Cloning a `Tree`
/// copies the whole arena, so handles stay valid in the copy and nothing is
/// shared with the source.
#[derive(Debug, Clone)]
pub struct Tree {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Tree {
    /// Fresh single-node tree. Container kinds get an empty children sequence.
    pub fn new(data: NodeData) -> Self {
        let has_children = data.kind.is_container();
        Self::with_root(data, has_children)
    }

    pub(crate) fn with_root(data: NodeData, has_children: bool) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            data,
            parent: None,
            children: has_children.then(Vec::new),
        });
        Self { arena, root }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: self.root,
            node: &self.arena[self.root],
        }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.arena.get(id).map(|node| NodeRef {
            tree: self,
            id,
            node,
        })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.arena.get_mut(id).map(|node| &mut node.data)
    }

    fn node(&self, id: NodeId) -> TreeResult<&TreeNode> {
        self.arena.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut TreeNode> {
        self.arena.get_mut(id).ok_or(TreeError::NodeNotFound(id))
    }

    /// Creates a node from `data` and appends it to `parent`.
    /// The parent's children sequence is created on first use.
    #[instrument(level = "trace", skip(self))]
    pub fn add_child(&mut self, parent: NodeId, data: NodeData) -> TreeResult<NodeId> {
        let has_children = data.kind.is_container();
        self.push_node(parent, data, has_children)
    }

    /// Like `add_child`, with explicit control over the children field.
    pub(crate) fn push_node(
        &mut self,
        parent: NodeId,
        data: NodeData,
        has_children: bool,
    ) -> TreeResult<NodeId> {
        self.node(parent)?;
        let id = self.arena.insert(TreeNode {
            data,
            parent: Some(parent),
            children: has_children.then(Vec::new),
        });
        self.link_child(parent, id)?;
        Ok(id)
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.node_mut(parent)?
            .children
            .get_or_insert_with(Vec::new)
            .push(child);
        Ok(())
    }

    /// Creates an empty children sequence if the node has none yet.
    pub(crate) fn ensure_children(&mut self, id: NodeId) -> TreeResult<()> {
        self.node_mut(id)?.children.get_or_insert_with(Vec::new);
        Ok(())
    }

    /// Moves every node of `subtree` into this tree as the last child of `parent`.
    #[instrument(level = "trace", skip(self, subtree))]
    pub fn graft(&mut self, parent: NodeId, subtree: Tree) -> TreeResult<NodeId> {
        self.node(parent)?;
        let Tree { mut arena, root } = subtree;
        let id = self
            .adopt(&mut arena, root, Some(parent))
            .ok_or(TreeError::NodeNotFound(root))?;
        self.link_child(parent, id)?;
        Ok(id)
    }

    /// Moves `src_id` and its descendants out of `src`, returning the new handle.
    fn adopt(
        &mut self,
        src: &mut Arena<TreeNode>,
        src_id: NodeId,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let TreeNode { data, children, .. } = src.remove(src_id)?;
        let id = self.arena.insert(TreeNode {
            data,
            parent,
            children: children.as_ref().map(|_| Vec::new()),
        });
        for child in children.into_iter().flatten() {
            if let Some(child_id) = self.adopt(src, child, Some(id)) {
                self.arena[id]
                    .children
                    .get_or_insert_with(Vec::new)
                    .push(child_id);
            }
        }
        Some(id)
    }

    /// Copies `src_id` and its descendants from `src`, returning the new handle.
    fn copy_from(&mut self, src: &Tree, src_id: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
        let node = src.arena.get(src_id)?;
        let id = self.arena.insert(TreeNode {
            data: node.data.clone(),
            parent,
            children: node.children.as_ref().map(|_| Vec::new()),
        });
        for &child in node.children.iter().flatten() {
            if let Some(child_id) = self.copy_from(src, child, Some(id)) {
                self.arena[id]
                    .children
                    .get_or_insert_with(Vec::new)
                    .push(child_id);
            }
        }
        Some(id)
    }

    /// Detached deep copy of the subtree rooted at `id`.
    #[instrument(level = "trace", skip(self))]
    pub fn clone_subtree(&self, id: NodeId) -> TreeResult<Tree> {
        let node = self.node(id)?;
        let mut out = Tree::with_root(node.data.clone(), node.children.is_some());
        let out_root = out.root;
        for &child in node.children.iter().flatten() {
            if let Some(child_id) = out.copy_from(self, child, Some(out_root)) {
                out.link_child(out_root, child_id)?;
            }
        }
        Ok(out)
    }

    /// Detached copy of a node. Mutating the copy never affects this tree.
    pub fn clone_node(&self, id: NodeId, depth: CloneDepth) -> TreeResult<Tree> {
        match depth {
            CloneDepth::Shallow => Ok(Tree::new(self.node(id)?.data.shallow_copy())),
            CloneDepth::Deep => self.clone_subtree(id),
        }
    }

    /// Unlinks `id` from its parent, returning the parent and the former position.
    fn unlink(&mut self, id: NodeId) -> TreeResult<(NodeId, usize)> {
        let parent = self.node(id)?.parent.ok_or(TreeError::RootRemoval)?;
        let siblings = self
            .node_mut(parent)?
            .children
            .as_mut()
            .ok_or(TreeError::NodeNotFound(id))?;
        let position = siblings
            .iter()
            .position(|&c| c == id)
            .ok_or(TreeError::NodeNotFound(id))?;
        siblings.remove(position);
        Ok((parent, position))
    }

    /// Detaches the subtree at `id` and returns it as a standalone tree.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<Tree> {
        if id == self.root {
            return Err(TreeError::RootRemoval);
        }
        self.unlink(id)?;
        let TreeNode { data, children, .. } =
            self.arena.remove(id).ok_or(TreeError::NodeNotFound(id))?;
        let mut out = Tree::with_root(data, children.is_some());
        let out_root = out.root;
        for child in children.into_iter().flatten() {
            if let Some(child_id) = out.adopt(&mut self.arena, child, Some(out_root)) {
                out.link_child(out_root, child_id)?;
            }
        }
        Ok(out)
    }

    /// Puts `replacement` where `id` was, at the same sibling position.
    /// Replacing the root swaps the whole tree.
    #[instrument(level = "trace", skip(self, replacement))]
    pub fn replace_subtree(&mut self, id: NodeId, replacement: Tree) -> TreeResult<NodeId> {
        if id == self.root {
            *self = replacement;
            return Ok(self.root);
        }
        let (parent, position) = self.unlink(id)?;
        self.release(id);
        let Tree { mut arena, root } = replacement;
        let new_id = self
            .adopt(&mut arena, root, Some(parent))
            .ok_or(TreeError::NodeNotFound(root))?;
        self.node_mut(parent)?
            .children
            .get_or_insert_with(Vec::new)
            .insert(position, new_id);
        Ok(new_id)
    }

    /// Frees an already unlinked node and its descendants.
    fn release(&mut self, id: NodeId) {
        if let Some(node) = self.arena.remove(id) {
            for child in node.children.into_iter().flatten() {
                self.release(child);
            }
        }
    }

    /// Root-relative path of `id`.
    pub fn path_of(&self, id: NodeId) -> TreeResult<NodePath> {
        let mut segments = Vec::new();
        let mut current = self.node(id)?;
        let mut current_id = id;
        while let Some(parent_id) = current.parent {
            let parent = self.node(parent_id)?;
            let position = parent
                .children
                .iter()
                .flatten()
                .position(|&c| c == current_id)
                .ok_or(TreeError::NodeNotFound(current_id))?;
            segments.push(position);
            current = parent;
            current_id = parent_id;
        }
        segments.reverse();
        Ok(NodePath::from(segments))
    }

    /// Leaf-like nodes get the text as value. Containers lose all children
    /// and get a single `#text` value child instead.
    #[instrument(level = "trace", skip(self, text))]
    pub fn set_text_content(&mut self, id: NodeId, text: impl Into<String>) -> TreeResult<()> {
        let text = text.into();
        let node = self.node_mut(id)?;
        if node.data.kind.is_leaf_like() {
            node.data.value = Some(Primitive::String(text));
            return Ok(());
        }
        let old = node.children.replace(Vec::new()).unwrap_or_default();
        for child in old {
            self.release(child);
        }
        self.push_node(id, NodeData::value(TEXT_NODE_NAME).with_value(text), false)?;
        Ok(())
    }

    /// Pre-order iterator over all nodes, left to right.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Pre-order iterator yielding each node with its root-relative path.
    pub fn iter_with_paths(&self) -> PathIterator<'_> {
        PathIterator::new(self)
    }

    /// Nodes without children, in document order.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|node| node.child_count() == 0)
            .map(|node| node.id())
            .collect()
    }
}

/// Structural equality: payload, children field presence and children,
/// recursively. Parent links and arena slots are ignored.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.root().structurally_eq(other.root())
    }
}

/// Borrowed view of one node in a [`Tree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    id: NodeId,
    node: &'a TreeNode,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn data(&self) -> &'a NodeData {
        &self.node.data
    }

    pub fn kind(&self) -> NodeKind {
        self.node.data.kind
    }

    pub fn name(&self) -> &'a str {
        &self.node.data.name
    }

    pub fn value(&self) -> Option<&'a Primitive> {
        self.node.data.value.as_ref()
    }

    pub fn attributes(&self) -> &'a [Attribute] {
        self.node.data.attributes()
    }

    pub fn attribute(&self, name: &str, namespace: Option<&str>) -> Option<&'a Attribute> {
        self.node.data.attribute(name, namespace)
    }

    pub fn attribute_value(&self, name: &str, namespace: Option<&str>) -> Option<&'a Primitive> {
        self.node.data.attribute_value(name, namespace)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent.and_then(|p| self.tree.get(p))
    }

    /// Whether the node carries a children sequence at all (possibly empty).
    pub fn has_children_field(&self) -> bool {
        self.node.children.is_some()
    }

    pub fn child_count(&self) -> usize {
        self.node.children.as_ref().map_or(0, Vec::len)
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        let id = *self.node.children.as_ref()?.get(index)?;
        self.tree.get(id)
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node
            .children
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&c| tree.get(c))
    }

    /// Position among the parent's children, `None` for the root.
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        let siblings = parent.node.children.as_ref()?;
        siblings.iter().position(|&c| c == self.id)
    }

    /// Pre-order iterator over this node and its descendants.
    pub fn descendants(&self) -> TreeIterator<'a> {
        TreeIterator::new(self.tree, self.id)
    }

    /// Value of a leaf-like node, otherwise the concatenated text of the
    /// descendants (comments and instructions excluded).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if self.kind().is_leaf_like() {
            if let Some(value) = self.value() {
                out.push_str(&value.to_string());
                return;
            }
        }
        for child in self.children() {
            if !child.kind().is_textless() {
                child.collect_text(out);
            }
        }
    }

    pub fn structurally_eq(&self, other: NodeRef<'_>) -> bool {
        self.data() == other.data()
            && self.has_children_field() == other.has_children_field()
            && self.child_count() == other.child_count()
            && self
                .children()
                .zip(other.children())
                .all(|(a, b)| a.structurally_eq(b))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("data", &self.node.data)
            .field("children", &self.child_count())
            .finish()
    }
}

pub struct TreeIterator<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a Tree, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.get(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.node.children.iter().flatten().rev() {
                    self.stack.push(child);
                }
                return Some(node);
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a Tree) -> Self {
        Self {
            tree,
            stack: vec![(tree.root, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get(current) {
                if !visited {
                    self.stack.push((current, true));
                    for &child in node.node.children.iter().flatten().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some(node);
                }
            }
        }
        None
    }
}

pub struct PathIterator<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeId, NodePath)>,
}

impl<'a> PathIterator<'a> {
    fn new(tree: &'a Tree) -> Self {
        Self {
            tree,
            stack: vec![(tree.root, NodePath::root())],
        }
    }
}

impl<'a> Iterator for PathIterator<'a> {
    type Item = (NodeRef<'a>, NodePath);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, path)) = self.stack.pop() {
            if let Some(node) = self.tree.get(current) {
                let children = node.node.children.as_deref().unwrap_or(&[]);
                for (index, &child) in children.iter().enumerate().rev() {
                    self.stack.push((child, path.child(index)));
                }
                return Some((node, path));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      root
    //      /  \
    //     a    b
    //          |
    //          c
    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new(NodeData::record("root"));
        let root = tree.root_id();
        let a = tree
            .add_child(root, NodeData::field("a").with_value("x"))
            .unwrap();
        let b = tree.add_child(root, NodeData::record("b")).unwrap();
        let c = tree
            .add_child(b, NodeData::field("c").with_value("y"))
            .unwrap();
        (tree, a, b, c)
    }

    #[test]
    fn test_add_child_sets_parent() {
        let (tree, a, b, c) = sample();
        assert_eq!(tree.get(a).unwrap().parent().unwrap().id(), tree.root_id());
        assert_eq!(tree.get(c).unwrap().parent().unwrap().id(), b);
        assert!(tree.root().parent().is_none());
    }

    #[test]
    fn test_iteration_orders() {
        let (tree, ..) = sample();
        let pre: Vec<&str> = tree.iter().map(|n| n.name()).collect();
        let post: Vec<&str> = tree.iter_postorder().map(|n| n.name()).collect();
        assert_eq!(pre, vec!["root", "a", "b", "c"]);
        assert_eq!(post, vec!["a", "c", "b", "root"]);
    }

    #[test]
    fn test_path_of_and_index_in_parent() {
        let (tree, a, b, c) = sample();
        assert_eq!(tree.path_of(tree.root_id()).unwrap(), NodePath::root());
        assert_eq!(tree.path_of(a).unwrap().segments(), &[0]);
        assert_eq!(tree.path_of(c).unwrap().segments(), &[1, 0]);
        assert_eq!(tree.get(b).unwrap().index_in_parent(), Some(1));
    }

    #[test]
    fn test_remove_subtree_frees_descendants() {
        let (mut tree, _, b, c) = sample();
        let removed = tree.remove_subtree(b).unwrap();
        assert_eq!(removed.root().name(), "b");
        assert_eq!(removed.root().child_count(), 1);
        assert!(!tree.contains(b));
        assert!(!tree.contains(c));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_remove_root_is_rejected() {
        let (mut tree, ..) = sample();
        let root = tree.root_id();
        assert!(matches!(
            tree.remove_subtree(root),
            Err(TreeError::RootRemoval)
        ));
    }

    #[test]
    fn test_replace_subtree_keeps_position() {
        let (mut tree, a, ..) = sample();
        let new_id = tree
            .replace_subtree(a, Tree::new(NodeData::field("z")))
            .unwrap();
        let names: Vec<&str> = tree.root().children().map(|n| n.name()).collect();
        assert_eq!(names, vec!["z", "b"]);
        assert_eq!(
            tree.get(new_id).unwrap().parent().unwrap().id(),
            tree.root_id()
        );
    }

    #[test]
    fn test_leaf_nodes() {
        let (tree, a, _, c) = sample();
        assert_eq!(tree.leaf_nodes(), vec![a, c]);
    }
}
