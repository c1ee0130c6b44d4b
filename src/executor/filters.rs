//! Predicate filtering for query execution
//!
//! Filters documents strictly according to predicates.
//! No type coercion: a number never equals a string, and range operators
//! only compare numbers with numbers and strings with strings.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::query::{ComparisonOp, LogicalOp, OPTIONS_MODIFIER};

use super::errors::{StoreError, StoreResult};

/// Resolves a dotted path (`address.city`) inside a document
pub(crate) fn field_value<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

/// A parsed predicate
#[derive(Debug, Clone)]
pub enum PredicateFilter {
    /// Every branch must match
    All(Vec<PredicateFilter>),
    /// At least one branch must match
    Any(Vec<PredicateFilter>),
    /// Every check on one field must match
    Field { path: String, checks: Vec<FieldCheck> },
}

/// One operator applied to one field
#[derive(Debug, Clone)]
pub enum FieldCheck {
    Compare(ComparisonOp, Value),
    In(Vec<Value>),
    Pattern(Regex),
}

impl PredicateFilter {
    /// Parses a filter document. Top-level keys are AND-ed.
    pub fn parse(filter: &Value) -> StoreResult<Self> {
        match filter {
            Value::Null => Ok(PredicateFilter::All(Vec::new())),
            Value::Object(map) => Self::parse_object(map),
            other => Err(StoreError::InvalidFilter(format!(
                "filter must be an object, got {}",
                other
            ))),
        }
    }

    fn parse_object(map: &Map<String, Value>) -> StoreResult<Self> {
        let mut clauses = Vec::with_capacity(map.len());

        for (key, value) in map {
            if let Some(op) = LogicalOp::from_token(key) {
                let branches = value
                    .as_array()
                    .ok_or_else(|| {
                        StoreError::InvalidFilter(format!("{} requires an array", op.token()))
                    })?
                    .iter()
                    .map(Self::parse)
                    .collect::<StoreResult<Vec<_>>>()?;

                clauses.push(match op {
                    LogicalOp::And => PredicateFilter::All(branches),
                    LogicalOp::Or => PredicateFilter::Any(branches),
                });
            } else if key.starts_with('$') {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported operator {}",
                    key
                )));
            } else {
                clauses.push(PredicateFilter::Field {
                    path: key.clone(),
                    checks: Self::parse_checks(key, value)?,
                });
            }
        }

        Ok(PredicateFilter::All(clauses))
    }

    fn parse_checks(field: &str, condition: &Value) -> StoreResult<Vec<FieldCheck>> {
        let ops = match condition.as_object() {
            Some(map) if map.keys().any(|k| k.starts_with('$')) => map,
            _ => return Ok(vec![FieldCheck::Compare(ComparisonOp::Eq, condition.clone())]),
        };

        let mut checks = Vec::with_capacity(ops.len());
        for (token, operand) in ops {
            if token == OPTIONS_MODIFIER {
                continue;
            }

            let op = ComparisonOp::from_token(token).ok_or_else(|| {
                StoreError::InvalidFilter(format!("unsupported operator {} on '{}'", token, field))
            })?;

            let check = match op {
                ComparisonOp::In => FieldCheck::In(
                    operand
                        .as_array()
                        .cloned()
                        .ok_or_else(|| {
                            StoreError::InvalidFilter(format!("$in on '{}' requires an array", field))
                        })?,
                ),
                ComparisonOp::Regex => {
                    let pattern = operand.as_str().ok_or_else(|| {
                        StoreError::InvalidFilter(format!("$regex on '{}' requires a string", field))
                    })?;
                    let flags = ops.get(OPTIONS_MODIFIER).and_then(Value::as_str).unwrap_or("");
                    FieldCheck::Pattern(build_regex(pattern, flags)?)
                }
                _ => FieldCheck::Compare(op, operand.clone()),
            };
            checks.push(check);
        }

        Ok(checks)
    }

    /// Checks if a document matches the predicate
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            PredicateFilter::All(branches) => branches.iter().all(|b| b.matches(document)),
            PredicateFilter::Any(branches) => branches.iter().any(|b| b.matches(document)),
            PredicateFilter::Field { path, checks } => {
                let actual = field_value(document, path);
                checks.iter().all(|check| check.matches(actual))
            }
        }
    }
}

impl FieldCheck {
    fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            FieldCheck::Compare(ComparisonOp::Eq, expected) => eq_match(actual, expected),
            FieldCheck::Compare(ComparisonOp::Ne, expected) => !eq_match(actual, expected),
            FieldCheck::Compare(op, bound) => match actual {
                Some(value) => any_element(value, |v| range_match(*op, v, bound)),
                None => false,
            },
            FieldCheck::In(options) => options.iter().any(|o| eq_match(actual, o)),
            FieldCheck::Pattern(regex) => match actual {
                Some(value) => any_element(value, |v| v.as_str().is_some_and(|s| regex.is_match(s))),
                None => false,
            },
        }
    }
}

fn build_regex(pattern: &str, flags: &str) -> StoreResult<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported regex option '{}'",
                    other
                )))
            }
        };
    }
    builder
        .build()
        .map_err(|e| StoreError::InvalidFilter(format!("invalid pattern: {}", e)))
}

/// Applies `check` to a scalar, or to every element of an array field
fn any_element(value: &Value, check: impl Fn(&Value) -> bool) -> bool {
    match value {
        Value::Array(items) => check(value) || items.iter().any(check),
        other => check(other),
    }
}

/// Equality with array membership. A null expectation matches a missing
/// field.
fn eq_match(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(value) => any_element(value, |v| values_equal(v, expected)),
    }
}

/// Exact equality (no coercion); integers and floats compare numerically
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(xf), Some(yf)) => xf == yf,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn range_match(op: ComparisonOp, actual: &Value, bound: &Value) -> bool {
    let ordering = match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(af), Some(bf)) => af.partial_cmp(&bf),
            _ => None,
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };

    match (op, ordering) {
        (ComparisonOp::Gt, Some(o)) => o == Ordering::Greater,
        (ComparisonOp::Gte, Some(o)) => o != Ordering::Less,
        (ComparisonOp::Lt, Some(o)) => o == Ordering::Less,
        (ComparisonOp::Lte, Some(o)) => o != Ordering::Greater,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matches(filter: Value, doc: Value) -> bool {
        PredicateFilter::parse(&filter).unwrap().matches(&doc)
    }

    #[test]
    fn test_equality_match() {
        let doc = json!({"name": "Alice", "age": 30});
        assert!(matches(json!({"name": "Alice"}), doc.clone()));
        assert!(!matches(json!({"name": "Bob"}), doc));
    }

    #[test]
    fn test_no_type_coercion() {
        let doc = json!({"value": 123});
        assert!(!matches(json!({"value": "123"}), doc.clone()));
        assert!(matches(json!({"value": 123}), doc.clone()));
        assert!(matches(json!({"value": 123.0}), doc.clone()));
        assert!(!matches(json!({"value": {"$gt": "100"}}), doc));
    }

    #[test]
    fn test_range_predicates() {
        let doc = json!({"age": 25});
        assert!(matches(json!({"age": {"$gte": 18}}), doc.clone()));
        assert!(matches(json!({"age": {"$lte": 30}}), doc.clone()));
        assert!(!matches(json!({"age": {"$gt": 25}}), doc.clone()));
        assert!(!matches(json!({"age": {"$lt": 25}}), doc.clone()));
        assert!(matches(json!({"age": {"$gt": 20, "$lt": 30}}), doc));
    }

    #[test]
    fn test_string_ranges() {
        let doc = json!({"orderDate": "2024-03-15"});
        assert!(matches(json!({"orderDate": {"$gte": "2024-01-01"}}), doc.clone()));
        assert!(!matches(json!({"orderDate": {"$lt": "2024-03-01"}}), doc));
    }

    #[test]
    fn test_multiple_predicates_and() {
        let doc = json!({"age": 25, "active": true});
        assert!(matches(json!({"age": {"$gte": 18}, "active": true}), doc.clone()));
        assert!(!matches(json!({"age": {"$gte": 18}, "active": false}), doc));
    }

    #[test]
    fn test_logical_operators() {
        let doc = json!({"city": "Delhi", "status": "active"});
        assert!(matches(json!({"$or": [{"city": "Mumbai"}, {"city": "Delhi"}]}), doc.clone()));
        assert!(!matches(json!({"$and": [{"city": "Delhi"}, {"status": "inactive"}]}), doc.clone()));
        assert!(matches(json!({"$or": [{"$and": [{"city": "Delhi"}, {"status": "active"}]}]}), doc));
    }

    #[test]
    fn test_missing_field_no_match() {
        let doc = json!({"name": "Alice"});
        assert!(!matches(json!({"age": 30}), doc.clone()));
        assert!(!matches(json!({"age": {"$gt": 1}}), doc.clone()));
        assert!(matches(json!({"age": null}), doc.clone()));
        assert!(matches(json!({"age": {"$ne": 30}}), doc));
    }

    #[test]
    fn test_null_value() {
        let doc = json!({"name": null});
        assert!(!matches(json!({"name": "Alice"}), doc.clone()));
        assert!(matches(json!({"name": null}), doc.clone()));
        assert!(!matches(json!({"name": {"$ne": null}}), doc));
    }

    #[test]
    fn test_in_and_array_membership() {
        let doc = json!({"city": "Pune", "tags": ["new", "vip"]});
        assert!(matches(json!({"city": {"$in": ["Delhi", "Pune"]}}), doc.clone()));
        assert!(!matches(json!({"city": {"$in": []}}), doc.clone()));
        assert!(matches(json!({"tags": "vip"}), doc.clone()));
        assert!(matches(json!({"tags": {"$in": ["old", "new"]}}), doc));
    }

    #[test]
    fn test_regex_with_options() {
        let doc = json!({"name": "Customer 42"});
        assert!(matches(json!({"name": {"$regex": "^Cust"}}), doc.clone()));
        assert!(!matches(json!({"name": {"$regex": "^cust"}}), doc.clone()));
        assert!(matches(json!({"name": {"$regex": "^cust", "$options": "i"}}), doc.clone()));
        assert!(!matches(json!({"age": {"$regex": "1"}}), doc));
    }

    #[test]
    fn test_regex_rejects_bad_input() {
        assert!(PredicateFilter::parse(&json!({"a": {"$regex": "("}})).is_err());
        assert!(PredicateFilter::parse(&json!({"a": {"$regex": "x", "$options": "q"}})).is_err());
    }

    #[test]
    fn test_dotted_path() {
        let doc = json!({"address": {"city": "Delhi"}});
        assert!(matches(json!({"address.city": "Delhi"}), doc.clone()));
        assert!(!matches(json!({"address.zip": "1"}), doc));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = PredicateFilter::parse(&json!({"a": {"$exists": true}})).unwrap_err();
        assert_eq!(err.code(), "ASKDB_STORE_INVALID_FILTER");
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(matches(json!({}), json!({"x": 1})));
        assert!(matches(Value::Null, json!({})));
    }
}
