//! Engine-level errors

use thiserror::Error;

/// Errors raised by queue engine operations.
///
/// Mirrors the HTTP-facing error kinds: a bad request maps to 400, a
/// not-found to 404. `Internal` is reserved for invariants that should be
/// unreachable and is never produced by validated input.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found")]
    NotFound,

    #[error("internal engine invariant violated: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
