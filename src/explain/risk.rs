//! Risk tiers for a candidate
//!
//! Rules are checked in order and the first match wins. Operators are
//! detected by walking object keys, never by searching serialized text.

use serde::Serialize;

use crate::query::{contains_operator, is_empty_predicate, QueryCandidate, QueryType};

/// Coarse cost tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Safe,
    Complex,
    Expensive,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "safe",
            RiskTier::Complex => "complex",
            RiskTier::Expensive => "expensive",
        }
    }
}

/// Outcome of risk analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    /// Stable machine-readable reason
    pub reason_code: &'static str,
    pub human_reason: String,
    /// Short display label
    pub label: String,
}

impl RiskAssessment {
    fn new(tier: RiskTier, reason_code: &'static str, human_reason: &str, label: &str) -> Self {
        Self {
            tier,
            reason_code,
            human_reason: human_reason.to_string(),
            label: label.to_string(),
        }
    }
}

pub fn assess(candidate: &QueryCandidate) -> RiskAssessment {
    let query = candidate.query();
    let kind = candidate.kind();

    if kind == Some(QueryType::Aggregate) {
        return RiskAssessment::new(
            RiskTier::Complex,
            "AGGREGATION_PIPELINE",
            "uses aggregation pipeline",
            "Complex Query",
        );
    }

    if contains_operator(query, "$regex") {
        return RiskAssessment::new(
            RiskTier::Expensive,
            "PATTERN_SEARCH",
            "pattern search causes high latency",
            "Potentially Expensive",
        );
    }

    if kind.is_some_and(|k| k.scans_on_empty_filter()) && is_empty_predicate(query) {
        return RiskAssessment::new(
            RiskTier::Expensive,
            "FULL_SCAN",
            "missing filters / full collection scan",
            "Full Collection Scan",
        );
    }

    if contains_operator(query, "$or") || contains_operator(query, "$in") {
        return RiskAssessment::new(
            RiskTier::Complex,
            "OR_IN_OPERATORS",
            "uses OR/IN operators",
            "Complex Query",
        );
    }

    RiskAssessment::new(
        RiskTier::Safe,
        "INDEX_ELIGIBLE",
        "uses exact-match operators eligible for index use",
        "Safe Query",
    )
}
