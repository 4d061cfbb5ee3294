//! Semantic intermediate tree and its functional transformation pipeline.
//!
//! Format adapters hand over a [`domain::Tree`]; the stages in
//! [`application`] (filter, map, select, branch/merge, reduce) turn it into a
//! new tree or a terminal value, which is handed back for serialization.

pub mod application;
pub mod config;
pub mod domain;
pub mod util;

pub use application::{Pipeline, PipelineError, PipelineResult, Transformed};
pub use config::Settings;
pub use domain::{NodeData, NodeKind, NodeRef, Primitive, Tree};
