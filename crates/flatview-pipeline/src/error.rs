//! Errors raised while reading pipeline definitions.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("unknown pipeline stage '{name}'")]
    UnknownStage { name: String },

    #[error("malformed {stage} stage: {reason}")]
    Malformed { stage: &'static str, reason: String },

    #[error("unsupported expression {expr}")]
    UnsupportedExpression { expr: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
