//! Declarative (SQL-like) rendering of a candidate
//!
//! Display only. The output is never executed, so the translation favors
//! readability over exact SQL semantics. Translation is total: any input
//! produces some text.

use serde_json::{Map, Value};

use crate::query::{json_kind, ComparisonOp, LogicalOp, QueryCandidate, QueryType, OPTIONS_MODIFIER};

/// Renders a candidate as SQL-like text
pub fn translate(candidate: &QueryCandidate) -> String {
    let collection = candidate.collection();
    if collection.trim().is_empty() {
        return "-- No valid query provided".to_string();
    }

    let select = match candidate.kind() {
        Some(QueryType::Find) | Some(QueryType::Search) => "SELECT *",
        Some(QueryType::Count) | Some(QueryType::CountDocuments) => "SELECT COUNT(*)",
        Some(QueryType::Aggregate) => {
            return format!(
                "-- SQL translation for complex aggregation pipelines is limited.\n\
                 -- Target collection: {}\n\
                 -- Pipeline stages: {}",
                collection,
                candidate.pipeline_stages().len()
            )
        }
        None => return format!("-- Unsupported query type: {}", candidate.query_type()),
    };

    let conditions = match candidate.query() {
        Value::Null => Vec::new(),
        Value::Object(map) => conditions(map),
        other => {
            return format!(
                "-- Unsupported predicate shape: expected an object, got {}",
                json_kind(other)
            )
        }
    };

    if conditions.is_empty() {
        format!("{} FROM {};", select, collection)
    } else {
        format!("{} FROM {} WHERE {};", select, collection, conditions.join(" AND "))
    }
}

fn conditions(map: &Map<String, Value>) -> Vec<String> {
    let mut out = Vec::new();

    for (key, value) in map {
        if let Some(op) = LogicalOp::from_token(key) {
            if let Some(group) = logical(op, value) {
                out.push(group);
            }
            continue;
        }

        match value {
            Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                for (token, operand) in ops {
                    if token == OPTIONS_MODIFIER {
                        continue;
                    }
                    out.push(comparison(key, token, operand));
                }
            }
            Value::Null => out.push(format!("{} IS NULL", key)),
            other => out.push(format!("{} = {}", key, literal(other))),
        }
    }

    out
}

fn logical(op: LogicalOp, value: &Value) -> Option<String> {
    let branches: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(conditions)
            .filter(|c| !c.is_empty())
            .map(|c| {
                if c.len() > 1 {
                    format!("({})", c.join(" AND "))
                } else {
                    c.join(" AND ")
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    if branches.is_empty() {
        return None;
    }
    let separator = format!(" {} ", op.sql_keyword());
    Some(format!("({})", branches.join(&separator)))
}

fn comparison(field: &str, token: &str, operand: &Value) -> String {
    match ComparisonOp::from_token(token) {
        Some(ComparisonOp::In) => match operand {
            Value::Array(items) => {
                let list: Vec<String> = items.iter().map(literal).collect();
                format!("{} IN ({})", field, list.join(", "))
            }
            other => format!("{} = {}", field, literal(other)),
        },
        Some(ComparisonOp::Regex) => {
            let pattern = match operand {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let pattern = pattern.strip_prefix('^').unwrap_or(&pattern);
            let pattern = pattern.strip_suffix('$').unwrap_or(pattern);
            format!("{} LIKE '%{}%'", field, pattern.replace('\'', "''"))
        }
        Some(ComparisonOp::Eq) if operand.is_null() => format!("{} IS NULL", field),
        Some(ComparisonOp::Ne) if operand.is_null() => format!("{} IS NOT NULL", field),
        Some(op) => format!("{} {} {}", field, op.sql_symbol(), literal(operand)),
        None => format!("{} = {}", field, literal(operand)),
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sql(query_type: &str, collection: &str, query: Value) -> String {
        translate(&QueryCandidate::new(query_type, collection, query, ""))
    }

    #[test]
    fn test_find_with_comparison() {
        assert_eq!(
            sql("find", "students", json!({"marks": {"$gt": 50}})),
            "SELECT * FROM students WHERE marks > 50;"
        );
    }

    #[test]
    fn test_empty_predicate_has_no_where() {
        assert_eq!(sql("find", "users", json!({})), "SELECT * FROM users;");
        assert_eq!(sql("search", "users", Value::Null), "SELECT * FROM users;");
        assert_eq!(sql("countDocuments", "users", json!({})), "SELECT COUNT(*) FROM users;");
    }

    #[test]
    fn test_count_with_equality() {
        assert_eq!(
            sql("count", "students", json!({"grade": "A", "active": true})),
            "SELECT COUNT(*) FROM students WHERE grade = 'A' AND active = true;"
        );
    }

    #[test]
    fn test_missing_collection() {
        assert_eq!(sql("find", "", json!({})), "-- No valid query provided");
    }

    #[test]
    fn test_unsupported_type() {
        assert_eq!(sql("update", "users", json!({})), "-- Unsupported query type: update");
    }

    #[test]
    fn test_aggregate_is_a_comment() {
        let text = sql(
            "aggregate",
            "orders",
            json!([{"$match": {"status": "paid"}}, {"$count": "n"}]),
        );
        assert!(text.starts_with("-- SQL translation for complex aggregation pipelines is limited."));
        assert!(text.contains("-- Target collection: orders"));
        assert!(text.contains("-- Pipeline stages: 2"));
    }

    #[test]
    fn test_non_object_predicate() {
        assert_eq!(
            sql("find", "users", json!([1, 2])),
            "-- Unsupported predicate shape: expected an object, got array"
        );
    }

    #[test]
    fn test_operator_table() {
        assert_eq!(
            sql(
                "find",
                "students",
                json!({"marks": {"$gte": 40, "$lt": 90}, "grade": {"$ne": "F"}})
            ),
            "SELECT * FROM students WHERE marks >= 40 AND marks < 90 AND grade != 'F';"
        );
    }

    #[test]
    fn test_in_list() {
        assert_eq!(
            sql("find", "students", json!({"grade": {"$in": ["A", "B"]}})),
            "SELECT * FROM students WHERE grade IN ('A', 'B');"
        );
    }

    #[test]
    fn test_regex_becomes_like() {
        assert_eq!(
            sql("find", "users", json!({"name": {"$regex": "^Ash$", "$options": "i"}})),
            "SELECT * FROM users WHERE name LIKE '%Ash%';"
        );
    }

    #[test]
    fn test_null_equality() {
        assert_eq!(
            sql("find", "users", json!({"email": null, "phone": {"$ne": null}})),
            "SELECT * FROM users WHERE email IS NULL AND phone IS NOT NULL;"
        );
    }

    #[test]
    fn test_quotes_are_doubled() {
        assert_eq!(
            sql("find", "users", json!({"name": "O'Brien"})),
            "SELECT * FROM users WHERE name = 'O''Brien';"
        );
    }

    #[test]
    fn test_nested_literal_is_quoted_json() {
        assert_eq!(
            sql("find", "users", json!({"tags": ["a"]})),
            r#"SELECT * FROM users WHERE tags = '["a"]';"#
        );
    }

    #[test]
    fn test_or_and_nesting() {
        let query = json!({
            "$or": [
                {"grade": "A"},
                {"$and": [{"marks": {"$gt": 80}}, {"age": {"$lt": 20}}]},
                {"name": "Ravi", "age": 19}
            ]
        });
        assert_eq!(
            sql("find", "students", query),
            "SELECT * FROM students WHERE (grade = 'A' OR (marks > 80 AND age < 20) OR (name = 'Ravi' AND age = 19));"
        );
    }

    #[test]
    fn test_unknown_operator_falls_back_to_equality() {
        assert_eq!(
            sql("find", "users", json!({"age": {"$nin": 3}})),
            "SELECT * FROM users WHERE age = 3;"
        );
    }

    #[test]
    fn test_degenerate_shapes_do_not_panic() {
        for query in [
            json!({"$or": []}),
            json!({"$or": "x"}),
            json!({"$and": [1, null, {}]}),
            json!({"a": {"$regex": 5}}),
            json!({"a": {"$in": "x"}}),
            json!("text"),
            json!(7),
        ] {
            let _ = sql("find", "c", query);
        }
        assert_eq!(sql("find", "c", json!({"$or": []})), "SELECT * FROM c;");
    }
}
