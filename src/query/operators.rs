//! Operator tables for document queries
//!
//! Every `$`-prefixed token askdb understands is listed here. The tables
//! are closed: a token missing from them is never coerced into something
//! else.

use serde_json::Value;

/// Modifier accepted next to `$regex`
pub const OPTIONS_MODIFIER: &str = "$options";

/// Field comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
    In,
    /// Text match
    Regex,
}

impl ComparisonOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$gt" => Some(ComparisonOp::Gt),
            "$gte" => Some(ComparisonOp::Gte),
            "$lt" => Some(ComparisonOp::Lt),
            "$lte" => Some(ComparisonOp::Lte),
            "$eq" => Some(ComparisonOp::Eq),
            "$ne" => Some(ComparisonOp::Ne),
            "$in" => Some(ComparisonOp::In),
            "$regex" => Some(ComparisonOp::Regex),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            ComparisonOp::Gt => "$gt",
            ComparisonOp::Gte => "$gte",
            ComparisonOp::Lt => "$lt",
            ComparisonOp::Lte => "$lte",
            ComparisonOp::Eq => "$eq",
            ComparisonOp::Ne => "$ne",
            ComparisonOp::In => "$in",
            ComparisonOp::Regex => "$regex",
        }
    }

    /// SQL operator used by the declarative translator
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "!=",
            ComparisonOp::In => "IN",
            ComparisonOp::Regex => "LIKE",
        }
    }
}

/// Logical combinators holding arrays of sub-predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$and" => Some(LogicalOp::And),
            "$or" => Some(LogicalOp::Or),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            LogicalOp::And => "$and",
            LogicalOp::Or => "$or",
        }
    }

    pub fn sql_keyword(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// Read-only aggregation pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Match,
    Group,
    Sort,
    Limit,
    Skip,
    Project,
    Count,
    Unwind,
}

impl PipelineStage {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$match" => Some(PipelineStage::Match),
            "$group" => Some(PipelineStage::Group),
            "$sort" => Some(PipelineStage::Sort),
            "$limit" => Some(PipelineStage::Limit),
            "$skip" => Some(PipelineStage::Skip),
            "$project" => Some(PipelineStage::Project),
            "$count" => Some(PipelineStage::Count),
            "$unwind" => Some(PipelineStage::Unwind),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            PipelineStage::Match => "$match",
            PipelineStage::Group => "$group",
            PipelineStage::Sort => "$sort",
            PipelineStage::Limit => "$limit",
            PipelineStage::Skip => "$skip",
            PipelineStage::Project => "$project",
            PipelineStage::Count => "$count",
            PipelineStage::Unwind => "$unwind",
        }
    }
}

/// `$group` accumulators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
}

impl Accumulator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$sum" => Some(Accumulator::Sum),
            "$avg" => Some(Accumulator::Avg),
            "$min" => Some(Accumulator::Min),
            "$max" => Some(Accumulator::Max),
            "$first" => Some(Accumulator::First),
            "$last" => Some(Accumulator::Last),
            _ => None,
        }
    }
}

/// Date extraction operators usable in group keys and projections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    DayOfMonth,
}

impl DatePart {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$year" => Some(DatePart::Year),
            "$month" => Some(DatePart::Month),
            "$dayOfMonth" => Some(DatePart::DayOfMonth),
            _ => None,
        }
    }
}

/// Returns true if `token` appears as an object key anywhere in `value`.
///
/// String values are data and never count as operators.
pub fn contains_operator(value: &Value, token: &str) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k == token || contains_operator(v, token)),
        Value::Array(items) => items.iter().any(|v| contains_operator(v, token)),
        _ => false,
    }
}

/// Field names that carry `token` in their operator expression, in
/// document order, searching through logical combinators.
pub fn operator_fields(value: &Value, token: &str) -> Vec<String> {
    let mut fields = Vec::new();
    collect_operator_fields(value, token, &mut fields);
    fields
}

fn collect_operator_fields(value: &Value, token: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if key.starts_with('$') {
                    collect_operator_fields(v, token, out);
                } else if v.as_object().is_some_and(|ops| ops.contains_key(token))
                    && !out.contains(key)
                {
                    out.push(key.clone());
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_operator_fields(item, token, out);
            }
        }
        _ => {}
    }
}

/// Returns true for a predicate with no conditions
pub fn is_empty_predicate(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comparison_tokens_round_trip() {
        for token in ["$gt", "$gte", "$lt", "$lte", "$eq", "$ne", "$in", "$regex"] {
            let op = ComparisonOp::from_token(token).unwrap();
            assert_eq!(op.token(), token);
        }
        assert!(ComparisonOp::from_token("$nin").is_none());
        assert!(ComparisonOp::from_token("gt").is_none());
    }

    #[test]
    fn test_stage_tokens() {
        assert_eq!(PipelineStage::from_token("$match"), Some(PipelineStage::Match));
        assert!(PipelineStage::from_token("$out").is_none());
        assert!(PipelineStage::from_token("$merge").is_none());
        assert!(PipelineStage::from_token("$lookup").is_none());
    }

    #[test]
    fn test_contains_operator_ignores_string_values() {
        let q = json!({"note": "$regex", "tags": ["$or"]});
        assert!(!contains_operator(&q, "$regex"));
        assert!(!contains_operator(&q, "$or"));
    }

    #[test]
    fn test_contains_operator_nested() {
        let q = json!({"$and": [{"a": 1}, {"$or": [{"b": {"$in": [1, 2]}}]}]});
        assert!(contains_operator(&q, "$or"));
        assert!(contains_operator(&q, "$in"));
        assert!(!contains_operator(&q, "$regex"));
    }

    #[test]
    fn test_operator_fields() {
        let q = json!({
            "$or": [{"name": {"$regex": "^Cust"}}, {"email": {"$regex": "x"}}],
            "city": {"$regex": "bad"}
        });
        assert_eq!(operator_fields(&q, "$regex"), vec!["name", "email", "city"]);
    }

    #[test]
    fn test_empty_predicate() {
        assert!(is_empty_predicate(&json!({})));
        assert!(is_empty_predicate(&json!([])));
        assert!(is_empty_predicate(&Value::Null));
        assert!(!is_empty_predicate(&json!({"a": 1})));
    }
}
