//! Safety gate for askdb
//!
//! Every candidate passes through here before it may reach the executor,
//! regardless of origin (model, cache, replay, hand-written JSON).
//!
//! # Checks (strict order, first failure stops)
//!
//! 1. Object shape with `query_type`, `collection`, `query` present
//! 2. Forbidden-substring scan over the canonical lowercase serialization
//! 3. `query_type` in the allowed read-only set
//! 4. `collection` is a non-empty string
//! 5. `query` is an object, or an array for aggregate
//! 6. Structural allow-list walk over every `$`-prefixed key
//! 7. Registered collection (only with `SafetyValidator::with_registry`)
//!
//! The substring scan is kept alongside the structural walk as a second,
//! independent layer.
//!
//! # Known false positives
//!
//! The scan rejects literal data that contains a forbidden word, e.g. a
//! product named "Update Kit" or a field called `updatedAt`.

mod errors;
mod safety;
mod structural;

pub use errors::{ValidationError, ValidationResult};
pub use safety::{SafeQuery, SafetyValidator, FORBIDDEN_TOKENS};
