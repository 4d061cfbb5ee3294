use tracing::{debug, instrument};

use crate::application::error::{PipelineError, PipelineResult, Stage};
use crate::application::stages::results_container;
use crate::config::Settings;
use crate::domain::{CallbackResult, NodeRef, Tree};

/// Flattens every match (root included) into a results container.
///
/// Matches are deep copies appended in pre-order discovery order, so a
/// matched node keeps its own subtree but loses its ancestry.
#[instrument(level = "debug", skip(tree, predicate, settings))]
pub fn select<P>(tree: &Tree, mut predicate: P, settings: &Settings) -> PipelineResult<Tree>
where
    P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
{
    let mut container = results_container(settings);
    let target = container.root_id();
    for node in tree.iter() {
        if predicate(node).map_err(PipelineError::callback(Stage::Select))? {
            container.graft(target, tree.clone_subtree(node.id())?)?;
        }
    }
    debug!(matches = container.root().child_count(), "select done");
    Ok(container)
}
