//! Result sorting for `$sort` and `$min`/`$max`
//!
//! Sorting is stable and deterministic: documents with equal keys keep
//! their input order.

use std::cmp::Ordering;

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::filters::field_value;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One key of a multi-key sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: String,
    pub direction: SortDirection,
}

/// Sorts result documents
pub struct ResultSorter;

impl ResultSorter {
    /// Parses a `$sort` body such as `{"total": -1, "name": 1}`
    pub fn parse_keys(spec: &Value) -> StoreResult<Vec<SortKey>> {
        let map = spec
            .as_object()
            .ok_or_else(|| StoreError::InvalidPipeline("$sort takes an object".into()))?;

        map.iter()
            .map(|(path, direction)| {
                let direction = match direction.as_i64() {
                    Some(1) => SortDirection::Asc,
                    Some(-1) => SortDirection::Desc,
                    _ => {
                        return Err(StoreError::InvalidPipeline(format!(
                            "sort direction for '{}' must be 1 or -1",
                            path
                        )))
                    }
                };
                Ok(SortKey {
                    path: path.clone(),
                    direction,
                })
            })
            .collect()
    }

    /// Sorts documents by the keys in priority order
    pub fn sort(documents: &mut [Value], keys: &[SortKey]) {
        documents.sort_by(|a, b| {
            keys.iter()
                .map(|key| {
                    let ordering =
                        Self::compare_values(field_value(a, &key.path), field_value(b, &key.path));
                    match key.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Compares two JSON values for sorting.
    ///
    /// Ordering rules:
    /// - missing < null < bool < number < string < array < object
    /// - For same types, natural ordering
    pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => {
                let type_order = |v: &Value| -> u8 {
                    match v {
                        Value::Null => 0,
                        Value::Bool(_) => 1,
                        Value::Number(_) => 2,
                        Value::String(_) => 3,
                        Value::Array(_) => 4,
                        Value::Object(_) => 5,
                    }
                };

                let a_type = type_order(a_val);
                let b_type = type_order(b_val);

                if a_type != b_type {
                    return a_type.cmp(&b_type);
                }

                match (a_val, b_val) {
                    (Value::Bool(a_b), Value::Bool(b_b)) => a_b.cmp(b_b),
                    (Value::Number(a_n), Value::Number(b_n)) => {
                        let a_f = a_n.as_f64().unwrap_or(0.0);
                        let b_f = b_n.as_f64().unwrap_or(0.0);
                        a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
                    }
                    (Value::String(a_s), Value::String(b_s)) => a_s.cmp(b_s),
                    (Value::Array(a_items), Value::Array(b_items)) => a_items
                        .iter()
                        .zip(b_items)
                        .map(|(x, y)| Self::compare_values(Some(x), Some(y)))
                        .find(|o| *o != Ordering::Equal)
                        .unwrap_or_else(|| a_items.len().cmp(&b_items.len())),
                    _ => Ordering::Equal,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_doc(id: &str, age: i64) -> Value {
        json!({"_id": id, "age": age})
    }

    fn ids(docs: &[Value]) -> Vec<&str> {
        docs.iter().map(|d| d["_id"].as_str().unwrap()).collect()
    }

    fn keys(spec: Value) -> Vec<SortKey> {
        ResultSorter::parse_keys(&spec).unwrap()
    }

    #[test]
    fn test_sort_ascending() {
        let mut docs = vec![make_doc("c", 30), make_doc("a", 20), make_doc("b", 25)];
        ResultSorter::sort(&mut docs, &keys(json!({"age": 1})));
        assert_eq!(ids(&docs), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_descending() {
        let mut docs = vec![make_doc("c", 30), make_doc("a", 20), make_doc("b", 25)];
        ResultSorter::sort(&mut docs, &keys(json!({"age": -1})));
        assert_eq!(ids(&docs), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_stable() {
        let mut docs = vec![make_doc("a", 25), make_doc("b", 25), make_doc("c", 25)];
        ResultSorter::sort(&mut docs, &keys(json!({"age": 1})));
        assert_eq!(ids(&docs), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_multi_key_sort() {
        let mut docs = vec![
            json!({"_id": "1", "grade": "B", "marks": 70}),
            json!({"_id": "2", "grade": "A", "marks": 80}),
            json!({"_id": "3", "grade": "A", "marks": 95}),
        ];
        ResultSorter::sort(&mut docs, &keys(json!({"grade": 1, "marks": -1})));
        assert_eq!(ids(&docs), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_missing_sorts_first() {
        let mut docs = vec![make_doc("a", 1), json!({"_id": "m"})];
        ResultSorter::sort(&mut docs, &keys(json!({"age": 1})));
        assert_eq!(ids(&docs), vec!["m", "a"]);
    }

    #[test]
    fn test_type_order() {
        assert_eq!(
            ResultSorter::compare_values(Some(&json!(5)), Some(&json!("5"))),
            Ordering::Less
        );
        assert_eq!(
            ResultSorter::compare_values(Some(&json!(null)), Some(&json!(false))),
            Ordering::Less
        );
    }

    #[test]
    fn test_bad_direction_rejected() {
        assert!(ResultSorter::parse_keys(&json!({"age": 0})).is_err());
        assert!(ResultSorter::parse_keys(&json!([1])).is_err());
    }
}
