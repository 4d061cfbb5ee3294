//! Generalized depth-first walk with a visitor contract.
//!
//! Visitor failures are caught per node and logged. The walk continues with
//! whatever result was already captured for that node (pre- or post-order);
//! only when a node produced no result at all does the failure propagate.

use tracing::{instrument, warn};

use crate::domain::arena::{NodeId, NodeRef, Tree};
use crate::domain::error::{CallbackError, CallbackResult, TreeError, TreeResult};
use crate::domain::path::NodePath;

/// When a node is visited relative to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalOrder {
    #[default]
    Pre,
    Post,
    /// Two visits per node, before and after its children
    Both,
}

impl TraversalOrder {
    fn visits_pre(self) -> bool {
        matches!(self, TraversalOrder::Pre | TraversalOrder::Both)
    }

    fn visits_post(self) -> bool {
        matches!(self, TraversalOrder::Post | TraversalOrder::Both)
    }
}

/// Position of the visited node relative to the traversal start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalContext {
    pub path: NodePath,
    pub depth: usize,
    /// None at the start node
    pub parent: Option<NodeId>,
    /// Position in the parent's children, None at the start node
    pub index: Option<usize>,
}

impl TraversalContext {
    fn start() -> Self {
        Self {
            path: NodePath::root(),
            depth: 0,
            parent: None,
            index: None,
        }
    }

    fn child(&self, parent: NodeId, index: usize) -> Self {
        Self {
            path: self.path.child(index),
            depth: self.depth + 1,
            parent: Some(parent),
            index: Some(index),
        }
    }
}

pub trait Visitor {
    type Output;

    fn visit(&mut self, node: NodeRef<'_>, ctx: &TraversalContext) -> CallbackResult<Self::Output>;

    /// Folds children's results into the node's own result.
    /// Default keeps the node's own result.
    fn combine_results(&mut self, own: Self::Output, children: Vec<Self::Output>) -> Self::Output {
        let _ = children;
        own
    }
}

impl<T, F> Visitor for F
where
    F: FnMut(NodeRef<'_>, &TraversalContext) -> CallbackResult<T>,
{
    type Output = T;

    fn visit(&mut self, node: NodeRef<'_>, ctx: &TraversalContext) -> CallbackResult<T> {
        self(node, ctx)
    }
}

/// Walks the whole tree from the root.
#[instrument(level = "debug", skip(tree, visitor))]
pub fn traverse<V: Visitor>(
    tree: &Tree,
    visitor: &mut V,
    order: TraversalOrder,
) -> TreeResult<V::Output> {
    walk(tree.root(), TraversalContext::start(), visitor, order)
}

/// Walks the subtree rooted at `start`; paths and depths are relative to it.
#[instrument(level = "debug", skip(tree, visitor))]
pub fn traverse_from<V: Visitor>(
    tree: &Tree,
    start: NodeId,
    visitor: &mut V,
    order: TraversalOrder,
) -> TreeResult<V::Output> {
    let node = tree.get(start).ok_or(TreeError::NodeNotFound(start))?;
    walk(node, TraversalContext::start(), visitor, order)
}

fn walk<V: Visitor>(
    node: NodeRef<'_>,
    ctx: TraversalContext,
    visitor: &mut V,
    order: TraversalOrder,
) -> TreeResult<V::Output> {
    let mut failure: Option<CallbackError> = None;

    let pre = if order.visits_pre() {
        capture(visitor.visit(node, &ctx), node, &ctx, &mut failure)
    } else {
        None
    };

    let mut child_results = Vec::with_capacity(node.child_count());
    for (index, child) in node.children().enumerate() {
        child_results.push(walk(child, ctx.child(node.id(), index), visitor, order)?);
    }

    let post = if order.visits_post() {
        capture(visitor.visit(node, &ctx), node, &ctx, &mut failure)
    } else {
        None
    };

    let own = match post.or(pre) {
        Some(result) => result,
        None => {
            return Err(TreeError::VisitorFailed {
                name: node.name().to_string(),
                path: ctx.path,
                source: failure.unwrap_or_else(|| "visitor produced no result".into()),
            })
        }
    };
    Ok(visitor.combine_results(own, child_results))
}

fn capture<T>(
    result: CallbackResult<T>,
    node: NodeRef<'_>,
    ctx: &TraversalContext,
    failure: &mut Option<CallbackError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(node = %node.name(), path = %ctx.path, error = %e, "visitor failed");
            *failure = Some(e);
            None
        }
    }
}

struct NodeCounter;

impl Visitor for NodeCounter {
    type Output = usize;

    fn visit(&mut self, _node: NodeRef<'_>, _ctx: &TraversalContext) -> CallbackResult<usize> {
        Ok(1)
    }

    fn combine_results(&mut self, own: usize, children: Vec<usize>) -> usize {
        own + children.into_iter().sum::<usize>()
    }
}

struct DepthMeter;

impl Visitor for DepthMeter {
    type Output = usize;

    fn visit(&mut self, _node: NodeRef<'_>, _ctx: &TraversalContext) -> CallbackResult<usize> {
        Ok(1)
    }

    fn combine_results(&mut self, own: usize, children: Vec<usize>) -> usize {
        own + children.into_iter().max().unwrap_or(0)
    }
}

/// Number of nodes reachable from the root.
pub fn count_nodes(tree: &Tree) -> TreeResult<usize> {
    traverse(tree, &mut NodeCounter, TraversalOrder::Post)
}

/// Number of levels; a single node has depth 1.
pub fn depth(tree: &Tree) -> TreeResult<usize> {
    traverse(tree, &mut DepthMeter, TraversalOrder::Post)
}
