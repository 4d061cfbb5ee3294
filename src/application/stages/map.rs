use tracing::{debug, instrument};

use crate::application::error::{PipelineError, PipelineResult, Stage};
use crate::domain::{CallbackResult, NodeData, NodeId, NodeRef, Tree};

/// Output of a map transform.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub data: NodeData,
    /// `None` maps the original children; `Some` replaces them as-is.
    pub children: Option<Vec<Tree>>,
}

impl Transformed {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            children: None,
        }
    }

    /// Explicit children. The original children are then not visited.
    pub fn with_children(data: NodeData, children: Vec<Tree>) -> Self {
        Self {
            data,
            children: Some(children),
        }
    }
}

impl From<NodeData> for Transformed {
    fn from(data: NodeData) -> Self {
        Self::new(data)
    }
}

/// Applies `transform` to every node and rebuilds the tree from the results.
///
/// A node that had no children field and got no explicit children ends up
/// without one, so an identity transform reproduces the input exactly.
#[instrument(level = "debug", skip(tree, transform))]
pub fn map<F>(tree: &Tree, mut transform: F) -> PipelineResult<Tree>
where
    F: FnMut(NodeRef<'_>) -> CallbackResult<Transformed>,
{
    let source = tree.root();
    let Transformed { data, children } =
        transform(source).map_err(PipelineError::callback(Stage::Map))?;
    let mut out = Tree::with_root(data, false);
    let target = out.root_id();
    attach_children(&mut out, target, source, children, &mut transform)?;
    debug!(nodes = out.node_count(), "map done");
    Ok(out)
}

fn attach_children<F>(
    out: &mut Tree,
    target: NodeId,
    source: NodeRef<'_>,
    explicit: Option<Vec<Tree>>,
    transform: &mut F,
) -> PipelineResult<()>
where
    F: FnMut(NodeRef<'_>) -> CallbackResult<Transformed>,
{
    match explicit {
        Some(subtrees) => {
            out.ensure_children(target)?;
            for subtree in subtrees {
                out.graft(target, subtree)?;
            }
        }
        None if source.has_children_field() => {
            out.ensure_children(target)?;
            for child in source.children() {
                let Transformed { data, children } =
                    transform(child).map_err(PipelineError::callback(Stage::Map))?;
                let id = out.push_node(target, data, false)?;
                attach_children(out, id, child, children, transform)?;
            }
        }
        None => {}
    }
    Ok(())
}
