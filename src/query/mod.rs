//! Query vocabulary for askdb
//!
//! Shared types consumed by every stage of the pipeline:
//!
//! - `QueryIntent`: coarse intent derived from the user's text
//! - `QueryCandidate`: the untrusted structured query proposed by the model
//! - `QueryType`: the closed set of read operations
//! - operator tables (`ComparisonOp`, `LogicalOp`, `PipelineStage`, ...)
//!
//! A candidate is immutable once constructed. Validation, translation and
//! risk analysis only inspect it.

mod candidate;
mod intent;
mod operators;

pub use candidate::{QueryCandidate, QueryType};
pub(crate) use candidate::json_kind;
pub use intent::{classify, QueryIntent};
pub use operators::{
    contains_operator, is_empty_predicate, operator_fields, Accumulator, ComparisonOp, DatePart,
    LogicalOp, PipelineStage, OPTIONS_MODIFIER,
};
