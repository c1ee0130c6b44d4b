//! Query Executor subsystem for askdb
//!
//! The executor consumes `SafeQuery` values only, so nothing that skipped
//! the safety gate can reach a store.
//!
//! # Dispatch
//!
//! - find, search: `DocumentStore::find`
//! - aggregate: `DocumentStore::aggregate` (a single stage object is a
//!   one-stage pipeline, an empty object an empty pipeline)
//! - count, countdocuments: `DocumentStore::count`
//!
//! Anything else is `UnsupportedExecutionType`, a contract breach.

mod errors;
mod executor;
mod filters;
mod memory;
mod pipeline;
mod result;
mod sorter;
mod store;

pub use errors::{ExecutionError, ExecutorResult, StoreError, StoreResult};
pub use executor::QueryExecutor;
pub use filters::{FieldCheck, PredicateFilter};
pub use memory::MemoryStore;
pub use pipeline::run_pipeline;
pub use result::{ExecutionOutcome, QueryResult};
pub use sorter::{ResultSorter, SortDirection, SortKey};
pub use store::DocumentStore;
