//! Schema error types
//!
//! All schema errors are raised while building the registry, before any
//! request is served.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema file could not be read
    #[error("Failed to read schema file {path}: {reason}")]
    Io { path: String, reason: String },

    /// Schema file is not valid registry JSON
    #[error("Malformed schema file {path}: {reason}")]
    Malformed { path: String, reason: String },

    /// Collection or field with an empty name
    #[error("Schema names must be non-empty: {0}")]
    EmptyName(String),

    /// Collection registered twice
    #[error("Duplicate collection: {0}")]
    DuplicateCollection(String),

    /// Field declared twice within a collection
    #[error("Duplicate field '{field}' in collection '{collection}'")]
    DuplicateField { collection: String, field: String },
}

impl SchemaError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Io { .. } => "ASKDB_SCHEMA_IO",
            SchemaError::Malformed { .. } => "ASKDB_SCHEMA_MALFORMED",
            SchemaError::EmptyName(_) => "ASKDB_SCHEMA_EMPTY_NAME",
            SchemaError::DuplicateCollection(_) => "ASKDB_SCHEMA_DUPLICATE_COLLECTION",
            SchemaError::DuplicateField { .. } => "ASKDB_SCHEMA_DUPLICATE_FIELD",
        }
    }
}
