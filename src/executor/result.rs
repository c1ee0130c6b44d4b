//! Result types for query execution

use serde::Serialize;
use serde_json::Value;

/// Documents for find/search/aggregate, a cardinality for count.
///
/// Serialized untagged so callers see an array or an integer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Documents(Vec<Value>),
    Count(u64),
}

impl QueryResult {
    /// Number of documents, or the count itself
    pub fn cardinality(&self) -> u64 {
        match self {
            QueryResult::Documents(docs) => docs.len() as u64,
            QueryResult::Count(n) => *n,
        }
    }

    pub fn documents(&self) -> Option<&[Value]> {
        match self {
            QueryResult::Documents(docs) => Some(docs),
            QueryResult::Count(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            QueryResult::Documents(docs) => Value::Array(docs.clone()),
            QueryResult::Count(n) => Value::from(*n),
        }
    }
}

/// Result of executing a validated query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    pub result: QueryResult,
    /// Wall-clock time spent in the store
    pub elapsed_millis: u64,
}
