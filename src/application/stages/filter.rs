use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::application::error::{PipelineError, PipelineResult, Stage};
use crate::application::stages::results_container;
use crate::config::Settings;
use crate::domain::{CallbackResult, NodeId, NodeRef, Tree};

/// Keeps every node that matches `predicate` or has a surviving descendant.
///
/// Decisions are made bottom-up. Survivors are shallow copies (scalar fields
/// only, no attributes), with the surviving children re-attached in order.
/// When nothing survives the result is an empty results container.
#[instrument(level = "debug", skip(tree, predicate, settings))]
pub fn filter<P>(tree: &Tree, mut predicate: P, settings: &Settings) -> PipelineResult<Tree>
where
    P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
{
    let source = tree.root();
    let mut survivors = HashSet::new();
    if !mark(source, &mut predicate, &mut survivors)? {
        debug!("filter: nothing survived");
        return Ok(results_container(settings));
    }

    let mut out = Tree::new(source.data().shallow_copy());
    let target = out.root_id();
    copy_survivors(source, &survivors, &mut out, target)?;
    debug!(
        kept = out.node_count(),
        of = tree.node_count(),
        "filter done"
    );
    Ok(out)
}

/// Records surviving nodes; returns whether `node` survives.
fn mark<P>(
    node: NodeRef<'_>,
    predicate: &mut P,
    survivors: &mut HashSet<NodeId>,
) -> PipelineResult<bool>
where
    P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
{
    let mut child_survives = false;
    for child in node.children() {
        child_survives |= mark(child, predicate, survivors)?;
    }
    let matched = predicate(node).map_err(PipelineError::callback(Stage::Filter))?;
    let survives = matched || child_survives;
    if survives {
        survivors.insert(node.id());
    }
    Ok(survives)
}

fn copy_survivors(
    source: NodeRef<'_>,
    survivors: &HashSet<NodeId>,
    out: &mut Tree,
    target: NodeId,
) -> PipelineResult<()> {
    for child in source.children().filter(|c| survivors.contains(&c.id())) {
        let id = out.add_child(target, child.data().shallow_copy())?;
        copy_survivors(child, survivors, out, id)?;
    }
    Ok(())
}
