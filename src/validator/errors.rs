//! Validation error types
//!
//! Error codes:
//! - ASKDB_VALIDATION_STRUCTURE
//! - ASKDB_FORBIDDEN_OPERATOR
//! - ASKDB_UNSUPPORTED_TYPE
//! - ASKDB_INVALID_COLLECTION
//! - ASKDB_INVALID_PREDICATE
//!
//! Validation failures are always surfaced. The pipeline never substitutes
//! a default query for a rejected candidate.

use thiserror::Error;

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Safety gate rejections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Candidate is not an object or lacks a required field
    #[error("Invalid query object structure: {0}")]
    Structure(String),

    /// Candidate contains a forbidden keyword or an operator outside the allow-list
    #[error("Unsafe query detected. Contains forbidden keyword: {token}")]
    ForbiddenOperator { token: String },

    /// `query_type` outside the read-only set
    #[error("Invalid query_type generated: {0}")]
    UnsupportedType(String),

    /// Missing, empty, non-string or unregistered collection
    #[error("Invalid or missing collection name: {0}")]
    InvalidCollection(String),

    /// Predicate or pipeline with the wrong shape
    #[error("Invalid query structure: {0}")]
    InvalidPredicate(String),
}

impl ValidationError {
    pub(crate) fn forbidden(token: impl Into<String>) -> Self {
        ValidationError::ForbiddenOperator {
            token: token.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Structure(_) => "ASKDB_VALIDATION_STRUCTURE",
            ValidationError::ForbiddenOperator { .. } => "ASKDB_FORBIDDEN_OPERATOR",
            ValidationError::UnsupportedType(_) => "ASKDB_UNSUPPORTED_TYPE",
            ValidationError::InvalidCollection(_) => "ASKDB_INVALID_COLLECTION",
            ValidationError::InvalidPredicate(_) => "ASKDB_INVALID_PREDICATE",
        }
    }

    /// The offending token for forbidden-operator rejections
    pub fn token(&self) -> Option<&str> {
        match self {
            ValidationError::ForbiddenOperator { token } => Some(token),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_display_names_token() {
        let err = ValidationError::forbidden("$where");
        assert_eq!(
            err.to_string(),
            "Unsafe query detected. Contains forbidden keyword: $where"
        );
        assert_eq!(err.token(), Some("$where"));
        assert_eq!(err.code(), "ASKDB_FORBIDDEN_OPERATOR");
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            ValidationError::Structure(String::new()),
            ValidationError::forbidden("x"),
            ValidationError::UnsupportedType(String::new()),
            ValidationError::InvalidCollection(String::new()),
            ValidationError::InvalidPredicate(String::new()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
