//! Proposal error types
//!
//! Error codes:
//! - ASKDB_MODEL_UNREACHABLE
//! - ASKDB_MODEL_TIMEOUT
//! - ASKDB_MODEL_MALFORMED

use std::time::Duration;

use thiserror::Error;

/// Result type for query generation
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Failures while obtaining a candidate from the model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Endpoint could not be reached or answered with an error status
    #[error("Query generation failed: model endpoint unreachable: {0}")]
    Unreachable(String),

    /// No answer within the configured timeout
    #[error("Query generation failed: model did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Answer was not a usable candidate
    #[error("Query generation failed: could not parse model output: {0}")]
    Malformed(String),
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Unreachable(_) => "ASKDB_MODEL_UNREACHABLE",
            GenerationError::Timeout(_) => "ASKDB_MODEL_TIMEOUT",
            GenerationError::Malformed(_) => "ASKDB_MODEL_MALFORMED",
        }
    }
}
