//! Schema type definitions
//!
//! Supported field types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - date: RFC 3339 timestamp or `YYYY-MM-DD` date
//! - id: document identifier or reference to another document

use std::fmt;

use serde::{Deserialize, Serialize};

/// Field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Date,
    Id,
}

impl FieldType {
    /// Returns the type name used in prompts and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Id => "id",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A single queryable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name as stored in documents
    pub name: String,
    /// Field data type
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn id(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Id)
    }
}

/// A queryable collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDef {
    /// Collection name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDef>,
}

impl CollectionDef {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Checks the collection definition itself
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("collection name is empty".into());
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(format!("field #{} of '{}' has an empty name", i, self.name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_serde_lowercase() {
        let f: FieldDef = serde_json::from_str(r#"{"name": "marks", "type": "int"}"#).unwrap();
        assert_eq!(f, FieldDef::int("marks"));

        let json = serde_json::to_string(&FieldDef::date("orderDate")).unwrap();
        assert!(json.contains(r#""type":"date""#));
    }

    #[test]
    fn test_unknown_field_type_rejected() {
        let r: Result<FieldDef, _> = serde_json::from_str(r#"{"name": "x", "type": "blob"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn test_collection_field_lookup() {
        let c = CollectionDef::new(
            "students",
            vec![FieldDef::string("name"), FieldDef::int("marks")],
        );
        assert_eq!(c.field("marks").map(|f| f.field_type), Some(FieldType::Int));
        assert!(c.field("age").is_none());
        assert_eq!(c.field_names(), vec!["name", "marks"]);
    }

    #[test]
    fn test_validate_structure_rejects_empty_names() {
        let c = CollectionDef::new("", vec![]);
        assert!(c.validate_structure().is_err());

        let c = CollectionDef::new("orders", vec![FieldDef::string(" ")]);
        assert!(c.validate_structure().is_err());
    }
}
