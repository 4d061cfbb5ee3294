//! Pipeline session: owns the working tree and at most one active branch.

use std::mem;

use tracing::{debug, instrument};

use crate::application::error::{PipelineError, PipelineResult};
use crate::application::stages::{self, BranchContext, Selection, Transformed};
use crate::config::Settings;
use crate::domain::{CallbackResult, NodeRef, Tree};

/// Chains stages over a working tree.
///
/// Non-terminal stages replace the working tree only after they succeed, so a
/// failed stage leaves the session as it was.
///
/// # Example
/// ```ignore
/// let mut pipeline = Pipeline::new(tree);
/// pipeline
///     .branch(|n| Ok(n.name() == "price"))?
///     .map(|n| Ok(n.data().clone().with_value(0).into()))?
///     .merge()?;
/// let tree = pipeline.into_tree();
/// ```
#[derive(Debug)]
pub struct Pipeline {
    settings: Settings,
    tree: Tree,
    branch: Option<BranchContext>,
}

impl Pipeline {
    pub fn new(tree: Tree) -> Self {
        Self::with_settings(tree, Settings::default())
    }

    pub fn with_settings(tree: Tree, settings: Settings) -> Self {
        Self {
            settings,
            tree,
            branch: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current working tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn is_branching(&self) -> bool {
        self.branch.is_some()
    }

    pub fn branch_context(&self) -> Option<&BranchContext> {
        self.branch.as_ref()
    }

    #[instrument(level = "debug", skip(self, predicate))]
    pub fn filter<P>(&mut self, predicate: P) -> PipelineResult<&mut Self>
    where
        P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
    {
        self.tree = stages::filter(&self.tree, predicate, &self.settings)?;
        Ok(self)
    }

    #[instrument(level = "debug", skip(self, transform))]
    pub fn map<F>(&mut self, transform: F) -> PipelineResult<&mut Self>
    where
        F: FnMut(NodeRef<'_>) -> CallbackResult<Transformed>,
    {
        self.tree = stages::map(&self.tree, transform)?;
        Ok(self)
    }

    #[instrument(level = "debug", skip(self, predicate))]
    pub fn select<P>(&mut self, predicate: P) -> PipelineResult<&mut Self>
    where
        P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
    {
        self.tree = stages::select(&self.tree, predicate, &self.settings)?;
        Ok(self)
    }

    /// Replaces the working tree with a results container of its matches.
    /// Fails with [`PipelineError::BranchActive`] while a branch is open.
    #[instrument(level = "debug", skip(self, predicate))]
    pub fn branch<P>(&mut self, mut predicate: P) -> PipelineResult<&mut Self>
    where
        P: FnMut(NodeRef<'_>) -> CallbackResult<bool>,
    {
        if self.branch.is_some() {
            return Err(PipelineError::BranchActive);
        }
        let selection = Selection::scan(&self.tree, &mut predicate)?;
        let container = selection.container(&self.settings)?;
        let parent = mem::replace(&mut self.tree, container);
        self.branch = Some(selection.into_context(parent));
        Ok(self)
    }

    /// Reconciles the working tree into the tree held by the open branch.
    /// No-op without an open branch. On failure the branch stays open.
    #[instrument(level = "debug", skip(self))]
    pub fn merge(&mut self) -> PipelineResult<&mut Self> {
        let Some(context) = self.branch.as_ref() else {
            debug!("merge without active branch ignored");
            return Ok(self);
        };
        self.tree = stages::merge(&self.tree, context)?;
        self.branch = None;
        Ok(self)
    }

    /// Terminal fold over the working tree in pre-order.
    pub fn reduce<A, R>(&self, initial: A, reducer: R) -> PipelineResult<A>
    where
        R: FnMut(A, NodeRef<'_>) -> CallbackResult<A>,
    {
        stages::reduce(&self.tree, initial, reducer)
    }
}
