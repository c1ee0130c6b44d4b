//! Storage boundary
//!
//! The store exposes reads only. There is no insert, update or delete on
//! this trait, so nothing downstream of the gate can write.

use serde_json::Value;

use super::errors::StoreResult;

/// Read-only document store
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching `filter`
    fn find(&self, collection: &str, filter: &Value) -> StoreResult<Vec<Value>>;

    /// Runs an aggregation pipeline over `collection`
    fn aggregate(&self, collection: &str, pipeline: &[Value]) -> StoreResult<Vec<Value>>;

    /// Number of documents in `collection` matching `filter`
    fn count(&self, collection: &str, filter: &Value) -> StoreResult<u64>;
}
