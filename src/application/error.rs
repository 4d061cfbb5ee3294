//! Application-level errors (wraps domain errors)

use std::fmt;

use thiserror::Error;

use crate::domain::{CallbackError, TreeError};

/// Pipeline stage that invoked a failing callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filter,
    Map,
    Select,
    Branch,
    Reduce,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Filter => "filter",
            Stage::Map => "map",
            Stage::Select => "select",
            Stage::Branch => "branch",
            Stage::Reduce => "reduce",
        };
        f.write_str(s)
    }
}

/// Pipeline errors wrap domain errors and add stage-level context.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("{stage} callback failed: {source}")]
    Callback {
        stage: Stage,
        #[source]
        source: CallbackError,
    },

    #[error("a branch is already active; merge it before branching again")]
    BranchActive,

    #[error("config error: {message}")]
    Config { message: String },
}

impl PipelineError {
    pub fn callback(stage: Stage) -> impl FnOnce(CallbackError) -> Self {
        move |source| PipelineError::Callback { stage, source }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
