//! Optimization advice
//!
//! Findings are independent and all of them are reported. The report
//! severity is the highest severity of any finding, `SAFE` when there are
//! none.

use serde::Serialize;
use serde_json::Value;

use crate::query::{
    contains_operator, is_empty_predicate, operator_fields, LogicalOp, PipelineStage,
    QueryCandidate, QueryType,
};

/// Report severity, ordered `Safe < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Safe,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SuggestionKind {
    Index,
    Pipeline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
    /// Shell snippet showing the fix
    pub example_remediation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizationReport {
    pub severity: Severity,
    pub suggestions: Vec<Suggestion>,
}

impl OptimizationReport {
    fn new() -> Self {
        Self {
            severity: Severity::Safe,
            suggestions: Vec::new(),
        }
    }

    fn add(&mut self, severity: Severity, kind: SuggestionKind, message: &str, remediation: String) {
        self.severity = self.severity.max(severity);
        self.suggestions.push(Suggestion {
            kind,
            message: message.to_string(),
            example_remediation: remediation,
        });
    }
}

const FULL_SCAN_MESSAGE: &str = "This query performs a full collection scan because it lacks filters. \
     Adding specific filter criteria or limits is highly recommended.";

const REGEX_MESSAGE: &str = "Regular expressions (especially leading wildcards) force expensive \
     collection scans. Consider using a Text Index for optimized text search.";

const OR_MESSAGE: &str = "$or queries can be slow. Ensure all fields within the $or clauses have \
     individual indexes, or consider a compound index if they are consistently queried together.";

const PIPELINE_MESSAGE: &str = "Aggregation pipelines should ideally start with a $match stage to \
     drastically reduce the number of documents passed to subsequent expensive stages.";

pub fn advise(candidate: &QueryCandidate) -> OptimizationReport {
    let mut report = OptimizationReport::new();
    let collection = candidate.collection();
    let query = candidate.query();
    let kind = candidate.kind();

    if kind.is_some_and(|k| k.scans_on_empty_filter()) && is_empty_predicate(query) {
        report.add(
            Severity::High,
            SuggestionKind::Index,
            FULL_SCAN_MESSAGE,
            format!(
                "db.{}.find({{ /* add indexed filter field here */ }}).limit(100)",
                collection
            ),
        );
    }

    if contains_operator(query, "$regex") {
        let field = operator_fields(query, "$regex")
            .into_iter()
            .next()
            .unwrap_or_else(|| "searchField".to_string());
        report.add(
            Severity::High,
            SuggestionKind::Index,
            REGEX_MESSAGE,
            format!("db.{}.createIndex({{ \"{}\": \"text\" }})", collection, field),
        );
    }

    let first_field = query
        .as_object()
        .and_then(|map| map.keys().find(|k| !k.starts_with('$')));
    if let Some(field) = first_field {
        if report.severity < Severity::High {
            report.add(
                Severity::Medium,
                SuggestionKind::Index,
                &format!(
                    "Ensure you have an index covering the filtered field '{}' to prevent collection scans.",
                    field
                ),
                format!("db.{}.createIndex({{ {}: 1 }})", collection, field),
            );
        }
    }

    if contains_operator(query, LogicalOp::Or.token()) {
        let fields = or_fields(query);
        let remediation = if fields.is_empty() {
            "// create a single-field index for each field used in $or".to_string()
        } else {
            fields
                .iter()
                .map(|f| format!("db.{}.createIndex({{ {}: 1 }})", collection, f))
                .collect::<Vec<_>>()
                .join("\n")
        };
        report.add(Severity::Medium, SuggestionKind::Index, OR_MESSAGE, remediation);
    }

    if kind == Some(QueryType::Aggregate) {
        let stages = candidate.pipeline_stages();
        let starts_with_match = stages
            .first()
            .and_then(Value::as_object)
            .is_some_and(|stage| stage.contains_key(PipelineStage::Match.token()));
        if !stages.is_empty() && !starts_with_match {
            report.add(
                Severity::High,
                SuggestionKind::Pipeline,
                PIPELINE_MESSAGE,
                "[\n  { $match: { \"status\": \"Active\" } },\n  // ... rest of pipeline\n]"
                    .to_string(),
            );
        }
    }

    report
}

/// Fields referenced inside any `$or` branch, deduplicated in order
fn or_fields(value: &Value) -> Vec<String> {
    let mut fields = Vec::new();
    collect_or_fields(value, false, &mut fields);
    fields
}

fn collect_or_fields(value: &Value, inside_or: bool, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key == LogicalOp::Or.token() {
                    collect_or_fields(v, true, out);
                } else if key.starts_with('$') {
                    collect_or_fields(v, inside_or, out);
                } else if inside_or {
                    if !out.contains(key) {
                        out.push(key.clone());
                    }
                } else {
                    collect_or_fields(v, false, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_or_fields(item, inside_or, out);
            }
        }
        _ => {}
    }
}
