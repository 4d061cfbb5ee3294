use tracing::instrument;

use crate::application::error::{PipelineError, PipelineResult, Stage};
use crate::domain::{CallbackResult, NodeRef, Tree};

/// Left fold over all nodes in pre-order.
#[instrument(level = "debug", skip(tree, initial, reducer))]
pub fn reduce<A, R>(tree: &Tree, initial: A, mut reducer: R) -> PipelineResult<A>
where
    R: FnMut(A, NodeRef<'_>) -> CallbackResult<A>,
{
    tree.iter().try_fold(initial, |acc, node| {
        reducer(acc, node).map_err(PipelineError::callback(Stage::Reduce))
    })
}
