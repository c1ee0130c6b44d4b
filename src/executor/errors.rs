//! Executor error types
//!
//! Error codes:
//! - ASKDB_UNSUPPORTED_EXECUTION_TYPE (ERROR, contract breach)
//! - ASKDB_STORE_IO (ERROR)
//! - ASKDB_STORE_MALFORMED (ERROR)
//! - ASKDB_STORE_INVALID_FILTER (ERROR)
//! - ASKDB_STORE_INVALID_PIPELINE (ERROR)
//! - ASKDB_STORE_UNAVAILABLE (ERROR)

use thiserror::Error;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutionError>;

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Data file could not be read
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    /// Data file is not a JSON array of objects
    #[error("Malformed collection file {path}: {reason}")]
    Malformed { path: String, reason: String },

    /// Filter the store cannot evaluate
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Pipeline stage the store cannot evaluate
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// Store state is unusable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io { .. } => "ASKDB_STORE_IO",
            StoreError::Malformed { .. } => "ASKDB_STORE_MALFORMED",
            StoreError::InvalidFilter(_) => "ASKDB_STORE_INVALID_FILTER",
            StoreError::InvalidPipeline(_) => "ASKDB_STORE_INVALID_PIPELINE",
            StoreError::Unavailable(_) => "ASKDB_STORE_UNAVAILABLE",
        }
    }
}

/// Failures while executing a validated query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A validated query carried a type the executor cannot dispatch.
    /// Unreachable when the validator works.
    #[error("Unsupported query type for execution: {0}")]
    UnsupportedExecutionType(String),

    /// The store failed
    #[error("Database query failed: {0}")]
    Storage(#[from] StoreError),
}

impl ExecutionError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionError::UnsupportedExecutionType(_) => "ASKDB_UNSUPPORTED_EXECUTION_TYPE",
            ExecutionError::Storage(e) => e.code(),
        }
    }

    /// True when the validator let through something it must not have
    pub fn is_contract_breach(&self) -> bool {
        matches!(self, ExecutionError::UnsupportedExecutionType(_))
    }
}
