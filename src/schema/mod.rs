//! Schema registry for askdb
//!
//! Static description of the queryable collections and their fields.
//! The registry is read-only once built and is shared by every request.
//!
//! Consumers:
//! - prompt construction (field lists per collection)
//! - the safety validator's registered-collection check

mod errors;
mod loader;
mod registry;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use registry::SchemaRegistry;
pub use types::{CollectionDef, FieldDef, FieldType};
