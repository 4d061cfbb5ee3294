use std::cmp::Ordering;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::error::{PipelineError, PipelineResult, Stage};
use crate::application::stages::results_container;
use crate::config::Settings;
use crate::domain::{
    remove_node_at_path, replace_node_at_path, CallbackResult, NodePath, NodeRef, Tree, TreeResult,
};

/// State of one in-flight branch/merge cycle.
#[derive(Debug, Clone)]
pub struct BranchContext {
    /// Tree as it stood at branch time
    parent: Tree,
    /// Deep copies of every match, in pre-order discovery order
    selected: Vec<Tree>,
    /// Root-relative path of each match, parallel to `selected`
    original_paths: Vec<NodePath>,
}

impl BranchContext {
    pub fn parent(&self) -> &Tree {
        &self.parent
    }

    pub fn selected_nodes(&self) -> &[Tree] {
        &self.selected
    }

    pub fn original_paths(&self) -> &[NodePath] {
        &self.original_paths
    }
}

/// Matches found by a branch scan, not yet bound to a parent tree.
pub(crate) struct Selection {
    selected: Vec<Tree>,
    paths: Vec<NodePath>,
}

impl Selection {
    pub(crate) fn scan<P>(tree: &Tree, predicate: &mut P) -> PipelineResult<Self>
    where
        P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
    {
        let mut selected = Vec::new();
        let mut paths = Vec::new();
        for (node, path) in tree.iter_with_paths() {
            if predicate(node).map_err(PipelineError::callback(Stage::Branch))? {
                selected.push(tree.clone_subtree(node.id())?);
                paths.push(path);
            }
        }
        debug!(matches = selected.len(), "branch scan done");
        Ok(Self { selected, paths })
    }

    /// Results container holding copies of the matches.
    pub(crate) fn container(&self, settings: &Settings) -> PipelineResult<Tree> {
        let mut container = results_container(settings);
        let target = container.root_id();
        for node in &self.selected {
            container.graft(target, node.clone())?;
        }
        Ok(container)
    }

    pub(crate) fn into_context(self, parent: Tree) -> BranchContext {
        BranchContext {
            parent,
            selected: self.selected,
            original_paths: self.paths,
        }
    }
}

/// Detaches copies of every match into a results container.
///
/// Returns the container, which becomes the working tree, and the context
/// needed by [`merge`] to put the results back.
#[instrument(level = "debug", skip(tree, predicate, settings))]
pub fn branch<P>(
    tree: Tree,
    mut predicate: P,
    settings: &Settings,
) -> PipelineResult<(Tree, BranchContext)>
where
    P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
{
    let selection = Selection::scan(&tree, &mut predicate)?;
    let container = selection.container(settings)?;
    Ok((container, selection.into_context(tree)))
}

/// Writes the children of `working` back to the locations recorded in `context`.
///
/// Children pair positionally with the recorded paths; a missing child
/// removes the node at its path. Edits are applied deepest first, then
/// right-most first, so no edit shifts an index another edit still needs.
/// The parent tree held by `context` is not touched: edits go to a copy.
#[instrument(level = "debug", skip(working, context))]
pub fn merge(working: &Tree, context: &BranchContext) -> PipelineResult<Tree> {
    let mut modified = working
        .root()
        .children()
        .map(|child| working.clone_subtree(child.id()))
        .collect::<TreeResult<Vec<_>>>()?
        .into_iter();

    let edits: Vec<(&NodePath, Option<Tree>)> = context
        .original_paths
        .iter()
        .map(|path| (path, modified.next()))
        .collect();
    let extra = modified.count();
    if extra > 0 {
        debug!(extra, "merge: ignoring extra modified nodes");
    }

    let mut result = context.parent.clone();
    let ordered = edits
        .into_iter()
        .sorted_by(|(a, _), (b, _)| edit_order(a, b));
    for (path, node) in ordered {
        match node {
            Some(replacement) if path.is_empty() => result = replacement,
            Some(replacement) => replace_node_at_path(&mut result, replacement, path)?,
            None => remove_node_at_path(&mut result, path)?,
        }
    }
    debug!(nodes = result.node_count(), "merge done");
    Ok(result)
}

/// Longer paths first, then larger final index first.
fn edit_order(a: &NodePath, b: &NodePath) -> Ordering {
    b.len()
        .cmp(&a.len())
        .then_with(|| b.last().cmp(&a.last()))
}
