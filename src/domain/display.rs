use std::fmt;

use termtree::Tree as TermTree;
use tracing::instrument;

use crate::domain::arena::{NodeRef, Tree};

pub trait ToTermTree {
    fn to_term_tree(&self) -> TermTree<String>;
}

impl ToTermTree for NodeRef<'_> {
    fn to_term_tree(&self) -> TermTree<String> {
        let leaves: Vec<_> = self.children().map(|c| c.to_term_tree()).collect();
        TermTree::new(self.data().to_string()).with_leaves(leaves)
    }
}

impl ToTermTree for Tree {
    #[instrument(level = "trace", skip(self))]
    fn to_term_tree(&self) -> TermTree<String> {
        self.root().to_term_tree()
    }
}

/// One line per node, drawn with box characters.
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_term_tree())
    }
}
