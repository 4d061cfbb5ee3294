//! Application layer: the functional algebra over semantic trees
//!
//! Stages are pure functions over `domain::Tree`; `Pipeline` chains them and
//! owns the branch/merge state.

pub mod error;
pub mod pipeline;
pub mod stages;

pub use error::{PipelineError, PipelineResult, Stage};
pub use pipeline::Pipeline;
pub use stages::{
    branch, filter, map, merge, reduce, results_container, select, BranchContext, Transformed,
};
