//! Read-only explanations of a candidate
//!
//! Three pure views used for display:
//!
//! - `translate`: SQL-like rendering
//! - `assess`: coarse risk tier
//! - `advise`: index and pipeline suggestions
//!
//! None of them fail and none of them influence whether a query runs.

mod advisor;
mod risk;
mod sql;

pub use advisor::{advise, OptimizationReport, Severity, Suggestion, SuggestionKind};
pub use risk::{assess, RiskAssessment, RiskTier};
pub use sql::translate;

use serde::Serialize;

use crate::query::QueryCandidate;

/// All three views of one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainReport {
    pub sql: String,
    pub risk: RiskAssessment,
    pub optimization: OptimizationReport,
}

pub fn explain(candidate: &QueryCandidate) -> ExplainReport {
    ExplainReport {
        sql: translate(candidate),
        risk: assess(candidate),
        optimization: advise(candidate),
    }
}
