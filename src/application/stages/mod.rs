//! Pipeline stages
//!
//! Each stage is a function from a tree (plus parameters) to a new tree or a
//! terminal value. Caller-supplied callables are invoked directly and their
//! failures abort the stage; the input tree is never mutated.

mod branch;
mod filter;
mod map;
mod reduce;
mod select;

pub use branch::{branch, merge, BranchContext};
pub use filter::filter;
pub use map::{map, Transformed};
pub use reduce::reduce;
pub use select::select;

pub(crate) use branch::Selection;

use crate::config::Settings;
use crate::domain::{NodeData, Tree};

/// Synthetic `Collection` holding flat or fragmentary stage output.
pub fn results_container(settings: &Settings) -> Tree {
    Tree::new(NodeData::collection(&settings.fragment_root_name))
}
