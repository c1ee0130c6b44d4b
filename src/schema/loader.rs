//! Schema loader for reading a registry from disk at startup
//!
//! File format:
//!
//! ```json
//! {
//!   "collections": [
//!     { "name": "students", "fields": [ { "name": "marks", "type": "int" } ] }
//!   ]
//! }
//! ```
//!
//! Malformed files fail startup; there is no partial registry.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::errors::{SchemaError, SchemaResult};
use super::registry::SchemaRegistry;
use super::types::CollectionDef;

#[derive(Deserialize)]
struct RegistryFile {
    collections: Vec<CollectionDef>,
}

/// Loads schema registries from JSON files
pub struct SchemaLoader;

impl SchemaLoader {
    /// Loads a registry from the given file
    pub fn load(path: &Path) -> SchemaResult<SchemaRegistry> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            SchemaError::Malformed { reason, .. } => SchemaError::Malformed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parses a registry from JSON text
    pub fn parse(content: &str) -> SchemaResult<SchemaRegistry> {
        let file: RegistryFile =
            serde_json::from_str(content).map_err(|e| SchemaError::Malformed {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;

        SchemaRegistry::new(file.collections)
    }

    /// Loads from `path` when given, otherwise returns the built-in registry
    pub fn load_or_builtin(path: Option<&Path>) -> SchemaResult<SchemaRegistry> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(SchemaRegistry::builtin()),
        }
    }
}
