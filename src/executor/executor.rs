//! Query executor for askdb
//!
//! Dispatches a validated query to the matching read operation of the
//! store and measures how long the store took. Timing never affects
//! control flow.

use std::sync::Arc;
use std::time::Instant;

use crate::query::QueryType;
use crate::validator::SafeQuery;

use super::errors::{ExecutionError, ExecutorResult};
use super::result::{ExecutionOutcome, QueryResult};
use super::store::DocumentStore;

/// Executes validated queries against a read-only store
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn DocumentStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Executes a validated query.
    ///
    /// Store failures surface as `ExecutionError::Storage`.
    pub fn execute(&self, query: &SafeQuery) -> ExecutorResult<ExecutionOutcome> {
        let candidate = query.candidate();
        let collection = candidate.collection();

        let start = Instant::now();
        let result = match candidate.kind() {
            Some(QueryType::Find) | Some(QueryType::Search) => {
                QueryResult::Documents(self.store.find(collection, candidate.query())?)
            }
            Some(QueryType::Aggregate) => QueryResult::Documents(
                self.store
                    .aggregate(collection, &candidate.pipeline_stages())?,
            ),
            Some(QueryType::Count) | Some(QueryType::CountDocuments) => {
                QueryResult::Count(self.store.count(collection, candidate.query())?)
            }
            None => {
                return Err(ExecutionError::UnsupportedExecutionType(
                    candidate.query_type().to_string(),
                ))
            }
        };
        let elapsed_millis = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(ExecutionOutcome {
            result,
            elapsed_millis,
        })
    }
}
