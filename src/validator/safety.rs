//! The safety validator and the `SafeQuery` proof type

use serde_json::{Map, Value};

use crate::query::{json_kind, QueryCandidate, QueryType};
use crate::schema::SchemaRegistry;

use super::errors::{ValidationError, ValidationResult};
use super::structural::{check_filter, check_pipeline};

/// Substrings rejected anywhere in a candidate's serialized form
pub const FORBIDDEN_TOKENS: &[&str] = &[
    "delete",
    "drop",
    "update",
    "insert",
    "$where",
    "$function",
    "$accumulator",
    "mapreduce",
    "eval",
    "$out",
    "$merge",
];

const REQUIRED_FIELDS: [&str; 3] = ["query_type", "collection", "query"];

/// A candidate that passed every safety check.
///
/// Only the validator can construct one, so holding a `SafeQuery` is proof
/// the query went through the gate.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeQuery {
    candidate: QueryCandidate,
}

impl SafeQuery {
    pub fn candidate(&self) -> &QueryCandidate {
        &self.candidate
    }

    /// Validated query type
    pub fn kind(&self) -> Option<QueryType> {
        self.candidate.kind()
    }

    pub fn into_candidate(self) -> QueryCandidate {
        self.candidate
    }

    /// Bypasses the gate for executor tests that need a query the validator
    /// would never produce.
    #[cfg(test)]
    pub(crate) fn assume_validated(candidate: QueryCandidate) -> Self {
        Self { candidate }
    }
}

/// Read-only contract enforcement
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyValidator<'a> {
    registry: Option<&'a SchemaRegistry>,
}

impl<'a> SafetyValidator<'a> {
    /// Validator without the registered-collection check
    pub fn new() -> Self {
        Self { registry: None }
    }

    /// Validator that also requires the collection to be registered
    pub fn with_registry(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn validate(&self, candidate: &QueryCandidate) -> ValidationResult<SafeQuery> {
        self.validate_value(&candidate.to_value())
    }

    /// Validates raw candidate JSON from any origin
    pub fn validate_value(&self, value: &Value) -> ValidationResult<SafeQuery> {
        let obj = value.as_object().ok_or_else(|| {
            ValidationError::Structure(format!("expected an object, got {}", json_kind(value)))
        })?;
        for field in REQUIRED_FIELDS {
            if !obj.contains_key(field) {
                return Err(ValidationError::Structure(format!(
                    "missing field '{}'",
                    field
                )));
            }
        }

        scan_forbidden(obj)?;

        let raw_type = obj.get("query_type").unwrap_or(&Value::Null);
        let query_type = raw_type
            .as_str()
            .and_then(QueryType::parse)
            .ok_or_else(|| ValidationError::UnsupportedType(display_value(raw_type)))?;

        let collection = match obj.get("collection") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.as_str(),
            Some(Value::String(_)) => {
                return Err(ValidationError::InvalidCollection(
                    "collection name is empty".into(),
                ))
            }
            other => {
                return Err(ValidationError::InvalidCollection(format!(
                    "expected a string, got {}",
                    json_kind(other.unwrap_or(&Value::Null))
                )))
            }
        };

        let query = obj.get("query").unwrap_or(&Value::Null);
        match (query_type, query) {
            (_, Value::Object(_)) => {}
            (QueryType::Aggregate, Value::Array(_)) => {}
            (QueryType::Aggregate, other) => {
                return Err(ValidationError::InvalidPredicate(format!(
                    "aggregate query must be an object or array, got {}",
                    json_kind(other)
                )))
            }
            (t, other) => {
                return Err(ValidationError::InvalidPredicate(format!(
                    "{} query must be an object, got {}",
                    t,
                    json_kind(other)
                )))
            }
        }

        match query_type {
            QueryType::Aggregate => check_pipeline(&pipeline_of(query))?,
            _ => check_filter(query)?,
        }

        if let Some(registry) = self.registry {
            if !registry.contains(collection) {
                return Err(ValidationError::InvalidCollection(format!(
                    "'{}' is not a registered collection",
                    collection
                )));
            }
        }

        let explanation = obj
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(SafeQuery {
            candidate: QueryCandidate::new(
                query_type.as_str(),
                collection,
                query.clone(),
                explanation,
            ),
        })
    }
}

/// Scans everything except `query_type`, which is matched exactly later
fn scan_forbidden(obj: &Map<String, Value>) -> ValidationResult<()> {
    let rest: Map<String, Value> = obj
        .iter()
        .filter(|(key, _)| key.as_str() != "query_type")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let canonical = Value::Object(rest).to_string().to_lowercase();

    match FORBIDDEN_TOKENS.iter().find(|t| canonical.contains(*t)) {
        Some(token) => Err(ValidationError::forbidden(*token)),
        None => Ok(()),
    }
}

fn pipeline_of(query: &Value) -> Vec<Value> {
    match query {
        Value::Array(stages) => stages.clone(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        other => vec![other.clone()],
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(value: Value) -> ValidationResult<SafeQuery> {
        SafetyValidator::new().validate_value(&value)
    }

    #[test]
    fn test_simple_find_accepted() {
        let safe = validate(json!({
            "query_type": "find",
            "collection": "students",
            "query": {"marks": {"$gt": 50}},
            "explanation": "students above 50"
        }))
        .unwrap();
        assert_eq!(safe.kind(), Some(QueryType::Find));
        assert_eq!(safe.candidate().collection(), "students");
        assert_eq!(safe.candidate().query(), &json!({"marks": {"$gt": 50}}));
    }

    #[test]
    fn test_empty_find_accepted_structurally() {
        assert!(validate(json!({"query_type": "find", "collection": "users", "query": {}})).is_ok());
    }

    #[test]
    fn test_update_type_is_unsupported() {
        let err = validate(json!({"query_type": "update", "collection": "users", "query": {}}))
            .unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedType("update".into()));
        assert_eq!(err.code(), "ASKDB_UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_where_rejected_at_any_depth() {
        let cases = [
            json!({"query_type": "find", "collection": "users", "query": {"$where": "this.password=='x'"}}),
            json!({"query_type": "find", "collection": "users", "query": {"$or": [{"a": 1}, {"$where": "1"}]}}),
            json!({"query_type": "aggregate", "collection": "users", "query": [{"$match": {"$and": [{"$WHERE": "x"}]}}]}),
        ];
        for case in cases {
            let err = validate(case).unwrap_err();
            assert_eq!(err.token(), Some("$where"));
        }
    }

    #[test]
    fn test_every_forbidden_token_rejected_in_any_case() {
        for token in FORBIDDEN_TOKENS {
            for spelled in [token.to_string(), token.to_uppercase()] {
                let candidate = json!({
                    "query_type": "find",
                    "collection": "orders",
                    "query": {"note": {"$eq": format!("x {} y", spelled)}}
                });
                let err = validate(candidate).unwrap_err();
                assert_eq!(err.token(), Some(*token), "token {}", spelled);
            }
        }
    }

    #[test]
    fn test_forbidden_token_in_collection_and_explanation() {
        let err = validate(json!({"query_type": "find", "collection": "dropbox", "query": {}}))
            .unwrap_err();
        assert_eq!(err.token(), Some("drop"));

        let err = validate(json!({
            "query_type": "count",
            "collection": "orders",
            "query": {},
            "explanation": "Insert nothing"
        }))
        .unwrap_err();
        assert_eq!(err.token(), Some("insert"));
    }

    #[test]
    fn test_false_positive_preserved() {
        let err = validate(json!({
            "query_type": "find",
            "collection": "products",
            "query": {"name": "Update Kit"}
        }))
        .unwrap_err();
        assert_eq!(err.token(), Some("update"));

        let err = validate(json!({
            "query_type": "find",
            "collection": "customers",
            "query": {"updatedAt": {"$gt": "2024-01-01"}}
        }))
        .unwrap_err();
        assert_eq!(err.token(), Some("update"));
    }

    #[test]
    fn test_structure_checks() {
        assert!(matches!(validate(json!([1, 2])), Err(ValidationError::Structure(_))));
        assert!(matches!(
            validate(json!({"query_type": "find", "collection": "a"})),
            Err(ValidationError::Structure(_))
        ));
    }

    #[test]
    fn test_structure_checked_before_scan() {
        let err = validate(json!({"collection": "drop"})).unwrap_err();
        assert!(matches!(err, ValidationError::Structure(_)));
    }

    #[test]
    fn test_query_type_case_insensitive() {
        let safe = validate(json!({"query_type": "CountDocuments", "collection": "orders", "query": {}}))
            .unwrap();
        assert_eq!(safe.candidate().query_type(), "countdocuments");
        assert_eq!(safe.kind(), Some(QueryType::CountDocuments));
    }

    #[test]
    fn test_non_string_type_unsupported() {
        let err = validate(json!({"query_type": 7, "collection": "orders", "query": {}})).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedType("7".into()));
    }

    #[test]
    fn test_collection_checks() {
        let err = validate(json!({"query_type": "find", "collection": "  ", "query": {}})).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCollection(_)));

        let err = validate(json!({"query_type": "find", "collection": 3, "query": {}})).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCollection(_)));
    }

    #[test]
    fn test_query_shape_per_type() {
        let err = validate(json!({"query_type": "find", "collection": "a", "query": [{"x": 1}]}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPredicate(_)));

        let err = validate(json!({"query_type": "count", "collection": "a", "query": "x"}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPredicate(_)));

        assert!(validate(json!({"query_type": "aggregate", "collection": "a", "query": []})).is_ok());
        assert!(validate(json!({"query_type": "aggregate", "collection": "a", "query": {}})).is_ok());
        assert!(validate(json!({
            "query_type": "aggregate",
            "collection": "a",
            "query": {"$match": {"x": 1}}
        }))
        .is_ok());
    }

    #[test]
    fn test_structural_walk_rejects_unknown_operator() {
        let err = validate(json!({
            "query_type": "find",
            "collection": "orders",
            "query": {"amount": {"$exists": true}}
        }))
        .unwrap_err();
        assert_eq!(err.token(), Some("$exists"));

        let err = validate(json!({
            "query_type": "aggregate",
            "collection": "orders",
            "query": [{"$lookup": {"from": "customers"}}]
        }))
        .unwrap_err();
        assert_eq!(err.token(), Some("$lookup"));
    }

    #[test]
    fn test_monthly_revenue_pipeline_accepted() {
        let safe = validate(json!({
            "query_type": "aggregate",
            "collection": "orders",
            "query": [
                {"$match": {"status": "Completed"}},
                {"$group": {"_id": {"$month": "$orderDate"}, "revenue": {"$sum": "$amount"}}},
                {"$sort": {"_id": 1}}
            ],
            "explanation": "Monthly revenue"
        }))
        .unwrap();
        assert_eq!(safe.kind(), Some(QueryType::Aggregate));
    }

    #[test]
    fn test_registry_check() {
        let registry = SchemaRegistry::builtin();
        let validator = SafetyValidator::with_registry(&registry);

        let err = validator
            .validate_value(&json!({"query_type": "find", "collection": "users", "query": {}}))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCollection(_)));

        assert!(validator
            .validate_value(&json!({"query_type": "find", "collection": "students", "query": {}}))
            .is_ok());
    }

    #[test]
    fn test_validate_candidate() {
        let candidate = QueryCandidate::new("FIND", "students", json!({"grade": "A"}), "");
        let safe = SafetyValidator::new().validate(&candidate).unwrap();
        assert_eq!(safe.into_candidate(), candidate);
    }
}
