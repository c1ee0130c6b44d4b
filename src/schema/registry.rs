//! In-memory schema registry

use std::collections::HashSet;

use serde::Serialize;

use super::errors::{SchemaError, SchemaResult};
use super::types::{CollectionDef, FieldDef};

/// Registry of queryable collections, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaRegistry {
    collections: Vec<CollectionDef>,
}

impl SchemaRegistry {
    /// Builds a registry, rejecting empty and duplicate names
    pub fn new(collections: Vec<CollectionDef>) -> SchemaResult<Self> {
        let mut seen = HashSet::new();

        for collection in &collections {
            collection
                .validate_structure()
                .map_err(SchemaError::EmptyName)?;

            if !seen.insert(collection.name.as_str()) {
                return Err(SchemaError::DuplicateCollection(collection.name.clone()));
            }

            let mut fields = HashSet::new();
            for field in &collection.fields {
                if !fields.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        collection: collection.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        Ok(Self { collections })
    }

    /// The built-in registry describing the default sample database
    pub fn builtin() -> Self {
        Self {
            collections: vec![
                CollectionDef::new(
                    "students",
                    vec![
                        FieldDef::string("name"),
                        FieldDef::int("marks"),
                        FieldDef::string("grade"),
                    ],
                ),
                CollectionDef::new(
                    "customers",
                    vec![
                        FieldDef::string("name"),
                        FieldDef::string("email"),
                        FieldDef::string("city"),
                        FieldDef::string("status"),
                        FieldDef::date("createdAt"),
                    ],
                ),
                CollectionDef::new(
                    "orders",
                    vec![
                        FieldDef::id("customerId"),
                        FieldDef::int("amount"),
                        FieldDef::string("category"),
                        FieldDef::date("orderDate"),
                        FieldDef::string("status"),
                    ],
                ),
                CollectionDef::new(
                    "products",
                    vec![
                        FieldDef::string("name"),
                        FieldDef::string("category"),
                        FieldDef::int("price"),
                        FieldDef::string("description"),
                    ],
                ),
            ],
        }
    }

    pub fn collections(&self) -> &[CollectionDef] {
        &self.collections
    }

    pub fn get(&self, name: &str) -> Option<&CollectionDef> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Renders every collection with its exact field list, one block per
    /// collection:
    ///
    /// ```text
    /// students:
    /// { name: string, marks: int, grade: string }
    /// ```
    pub fn describe(&self) -> String {
        self.collections
            .iter()
            .map(|c| {
                let fields: Vec<String> = c
                    .fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.field_type))
                    .collect();
                format!("{}:\n{{ {} }}", c.name, fields.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
