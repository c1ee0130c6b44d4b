//! Query candidates proposed by the model
//!
//! A candidate is untrusted. It can carry a query type outside the allowed
//! set or a malformed predicate; rejecting those is the safety validator's
//! job, not this module's. This module only guarantees the object shape.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Read operations a candidate may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Find,
    Aggregate,
    Count,
    CountDocuments,
    Search,
}

impl QueryType {
    /// The complete allowed set
    pub const ALL: [QueryType; 5] = [
        QueryType::Find,
        QueryType::Aggregate,
        QueryType::Count,
        QueryType::CountDocuments,
        QueryType::Search,
    ];

    /// Parses a query type case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == lowered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Find => "find",
            QueryType::Aggregate => "aggregate",
            QueryType::Count => "count",
            QueryType::CountDocuments => "countdocuments",
            QueryType::Search => "search",
        }
    }

    /// Operations that read the whole collection when the filter is empty.
    /// `search` is excluded: an empty search is treated as a lookup.
    pub fn scans_on_empty_filter(&self) -> bool {
        matches!(
            self,
            QueryType::Find | QueryType::Count | QueryType::CountDocuments
        )
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured, not-yet-trusted query
///
/// Fields are private so a candidate cannot be altered after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryCandidate {
    query_type: String,
    collection: String,
    query: Value,
    explanation: String,
}

impl QueryCandidate {
    /// Creates a candidate, normalizing the query type to lowercase
    pub fn new(
        query_type: impl AsRef<str>,
        collection: impl Into<String>,
        query: Value,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            query_type: query_type.as_ref().trim().to_lowercase(),
            collection: collection.into(),
            query,
            explanation: explanation.into(),
        }
    }

    /// Decodes a candidate from model output, requiring the full shape:
    /// `query_type` and `collection` strings, `query` an object or array,
    /// `explanation` optional text.
    pub fn decode(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, got {}", json_kind(value)))?;

        let query_type = required_str(obj, "query_type")?;
        let collection = required_str(obj, "collection")?;

        let query = obj
            .get("query")
            .ok_or_else(|| "missing field 'query'".to_string())?;
        if !(query.is_object() || query.is_array()) {
            return Err(format!(
                "field 'query' must be an object or array, got {}",
                json_kind(query)
            ));
        }

        let explanation = match obj.get("explanation") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(format!(
                    "field 'explanation' must be text, got {}",
                    json_kind(other)
                ))
            }
        };

        Ok(Self::new(query_type, collection, query.clone(), explanation))
    }

    /// Builds a candidate from arbitrary JSON for display-only paths.
    ///
    /// Missing or mistyped fields become empty values so that translation
    /// and risk analysis can still describe what was supplied.
    pub fn from_json_lossy(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self::new(
            text("query_type"),
            text("collection"),
            value.get("query").cloned().unwrap_or(Value::Null),
            text("explanation"),
        )
    }

    /// Normalized (lowercase) query type as supplied
    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    /// Parsed query type, `None` when outside the allowed set
    pub fn kind(&self) -> Option<QueryType> {
        QueryType::parse(&self.query_type)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn query(&self) -> &Value {
        &self.query
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Pipeline stages of an aggregate candidate.
    ///
    /// A single stage object is treated as a one-stage pipeline and an empty
    /// object as an empty pipeline.
    pub fn pipeline_stages(&self) -> Vec<Value> {
        match &self.query {
            Value::Array(stages) => stages.clone(),
            Value::Object(map) if map.is_empty() => Vec::new(),
            Value::Object(_) => vec![self.query.clone()],
            _ => Vec::new(),
        }
    }

    /// JSON form with the wire field names
    pub fn to_value(&self) -> Value {
        json!({
            "query_type": self.query_type,
            "collection": self.collection,
            "query": self.query,
            "explanation": self.explanation,
        })
    }
}

fn required_str(obj: &Map<String, Value>, key: &str) -> Result<String, String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!(
            "field '{}' must be a string, got {}",
            key,
            json_kind(other)
        )),
        None => Err(format!("missing field '{}'", key)),
    }
}

/// Short name of a JSON value's kind for error messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
