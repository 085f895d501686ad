//! This module implements the [`FoldingError`] type.

use thiserror::Error;

/// Errors that can arise during one folding round. None of them is retried
/// internally: a retry requires re-deriving fresh challenges from a clean
/// transcript, which is the caller's responsibility.
#[derive(Error, Debug, Clone)]
pub enum FoldingError {
    #[error("the instances disagree on the circuit size (expected: {0}, got: {1})")]
    SizeMismatch(usize, usize),

    #[error("the perturbator's constant coefficient disagrees with the accumulator's target sum")]
    TargetSumMismatch,

    #[error("the instance is malformed: {0}")]
    MalformedInstance(String),
}
