//! In-memory document store
//!
//! Collections are loaded once from `<data_dir>/<collection>.json`, each
//! file a JSON array of objects. After loading the store only reads.
//! Unknown collections read as empty.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::filters::PredicateFilter;
use super::pipeline::run_pipeline;
use super::store::DocumentStore;

/// Thread-safe in-memory `DocumentStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form used by tests and fixtures
    pub fn with_collection(mut self, name: impl Into<String>, documents: Vec<Value>) -> Self {
        if let Ok(collections) = self.collections.get_mut() {
            collections.insert(name.into(), documents);
        }
        self
    }

    /// Loads every `*.json` file in `dir` as a collection named after the
    /// file stem
    pub fn load_dir(dir: &Path) -> StoreResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| StoreError::Io {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut collections = HashMap::new();
        for entry in entries {
            let path = entry
                .map_err(|e| StoreError::Io {
                    path: dir.display().to_string(),
                    reason: e.to_string(),
                })?
                .path();

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };

            collections.insert(name, Self::read_collection(&path)?);
        }

        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    fn read_collection(path: &Path) -> StoreResult<Vec<Value>> {
        let content = fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let malformed = |reason: String| StoreError::Malformed {
            path: path.display().to_string(),
            reason,
        };

        let documents: Vec<Value> =
            serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;

        if let Some(index) = documents.iter().position(|d| !d.is_object()) {
            return Err(malformed(format!("element #{} is not an object", index)));
        }

        Ok(documents)
    }

    /// Names of the loaded collections, sorted
    pub fn collection_names(&self) -> StoreResult<Vec<String>> {
        let collections = self.read_lock()?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn read_lock(
        &self,
    ) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<Value>>>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Unavailable("Lock poisoned".to_string()))
    }

    fn matching(&self, collection: &str, filter: &Value) -> StoreResult<Vec<Value>> {
        let filter = PredicateFilter::parse(filter)?;
        let collections = self.read_lock()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }
}

impl DocumentStore for MemoryStore {
    fn find(&self, collection: &str, filter: &Value) -> StoreResult<Vec<Value>> {
        self.matching(collection, filter)
    }

    fn aggregate(&self, collection: &str, pipeline: &[Value]) -> StoreResult<Vec<Value>> {
        let documents = {
            let collections = self.read_lock()?;
            collections.get(collection).cloned().unwrap_or_default()
        };
        run_pipeline(documents, pipeline)
    }

    fn count(&self, collection: &str, filter: &Value) -> StoreResult<u64> {
        let filter = PredicateFilter::parse(filter)?;
        let collections = self.read_lock()?;
        let count = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn students() -> MemoryStore {
        MemoryStore::new().with_collection(
            "students",
            vec![
                json!({"name": "Asha", "marks": 91, "grade": "A"}),
                json!({"name": "Ravi", "marks": 45, "grade": "C"}),
                json!({"name": "Meera", "marks": 67, "grade": "B"}),
            ],
        )
    }

    #[test]
    fn test_find_with_filter() {
        let store = students();
        let docs = store.find("students", &json!({"marks": {"$gt": 50}})).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["name"], "Asha");
    }

    #[test]
    fn test_count() {
        let store = students();
        assert_eq!(store.count("students", &json!({})).unwrap(), 3);
        assert_eq!(store.count("students", &json!({"grade": "A"})).unwrap(), 1);
    }

    #[test]
    fn test_unknown_collection_is_empty() {
        let store = students();
        assert!(store.find("users", &json!({})).unwrap().is_empty());
        assert_eq!(store.count("users", &json!({})).unwrap(), 0);
        assert!(store.aggregate("users", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_aggregate() {
        let store = students();
        let out = store
            .aggregate(
                "students",
                &[json!({"$group": {"_id": null, "avg": {"$avg": "$marks"}}})],
            )
            .unwrap();
        assert_eq!(out, vec![json!({"_id": null, "avg": 67.66666666666667})]);
    }

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("orders.json"),
            r#"[{"amount": 10}, {"amount": 20}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = MemoryStore::load_dir(dir.path()).unwrap();
        assert_eq!(store.collection_names().unwrap(), vec!["orders"]);
        assert_eq!(store.count("orders", &json!({})).unwrap(), 2);
    }

    #[test]
    fn test_load_dir_rejects_non_objects() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "[1, 2]").unwrap();

        let err = MemoryStore::load_dir(dir.path()).unwrap_err();
        assert_eq!(err.code(), "ASKDB_STORE_MALFORMED");
    }

    #[test]
    fn test_missing_dir() {
        let err = MemoryStore::load_dir(Path::new("/nonexistent/askdb-data")).unwrap_err();
        assert_eq!(err.code(), "ASKDB_STORE_IO");
    }

    #[test]
    fn test_invalid_filter_surfaces() {
        let store = students();
        let err = store.find("students", &json!({"marks": {"$where": 1}})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }
}
