//! Gateway error types
//!
//! Wraps the failure of whichever stage stopped the request. Messages are
//! the stage's own, so the caller sees what failed.

use thiserror::Error;

use crate::executor::ExecutionError;
use crate::proposal::GenerationError;
use crate::validator::ValidationError;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::EmptyQuestion => "ASKDB_EMPTY_QUESTION",
            GatewayError::Generation(e) => e.code(),
            GatewayError::Validation(e) => e.code(),
            GatewayError::Execution(e) => e.code(),
        }
    }
}
