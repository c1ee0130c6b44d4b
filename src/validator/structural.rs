//! Structural allow-list walk
//!
//! Walks predicates and pipelines recursively and rejects every `$`-prefixed
//! key that is not allowed in its context. Unlike the substring scan this
//! layer is exact: it cannot be fooled by a forbidden operator spelled
//! inside an allowed one, and it does not trip over literal text.
//!
//! Contexts:
//! - filter: `$and`, `$or` at predicate level; comparison operators and
//!   `$options` (next to `$regex`) inside field conditions
//! - pipeline: one stage key per stage object, from `PipelineStage`
//! - expression (`$group`, `$project`): accumulators at the top of a
//!   group field, date parts anywhere

use serde_json::{Map, Value};

use crate::query::{
    json_kind, Accumulator, ComparisonOp, DatePart, LogicalOp, PipelineStage, OPTIONS_MODIFIER,
};

use super::errors::{ValidationError, ValidationResult};

/// Deepest nesting accepted in a predicate or pipeline
const MAX_DEPTH: usize = 32;

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidPredicate(reason.into())
}

fn descend(depth: usize) -> ValidationResult<usize> {
    if depth >= MAX_DEPTH {
        return Err(invalid(format!(
            "nesting deeper than {} levels",
            MAX_DEPTH
        )));
    }
    Ok(depth + 1)
}

/// Checks a find/count filter
pub(crate) fn check_filter(filter: &Value) -> ValidationResult<()> {
    check_filter_at(filter, 0)
}

/// Checks the stages of an aggregation pipeline
pub(crate) fn check_pipeline(stages: &[Value]) -> ValidationResult<()> {
    for (index, stage) in stages.iter().enumerate() {
        check_stage(index, stage)?;
    }
    Ok(())
}

fn check_filter_at(filter: &Value, depth: usize) -> ValidationResult<()> {
    let depth = descend(depth)?;
    let map = filter
        .as_object()
        .ok_or_else(|| invalid(format!("filter must be an object, got {}", json_kind(filter))))?;

    for (key, value) in map {
        if let Some(op) = LogicalOp::from_token(key) {
            let branches = value.as_array().ok_or_else(|| {
                invalid(format!("{} must hold an array of predicates", op.token()))
            })?;
            if branches.is_empty() {
                return Err(invalid(format!("{} must not be empty", op.token())));
            }
            for branch in branches {
                check_filter_at(branch, depth)?;
            }
        } else if key.starts_with('$') {
            return Err(ValidationError::forbidden(key.as_str()));
        } else {
            check_condition(key, value, depth)?;
        }
    }

    Ok(())
}

fn check_condition(field: &str, value: &Value, depth: usize) -> ValidationResult<()> {
    let ops = match value.as_object() {
        Some(map) if map.keys().any(|k| k.starts_with('$')) => map,
        _ => return check_literal(value, depth),
    };

    if ops.keys().any(|k| !k.starts_with('$')) {
        return Err(invalid(format!(
            "condition on '{}' mixes operators and literal keys",
            field
        )));
    }

    for (token, operand) in ops {
        if token == OPTIONS_MODIFIER {
            if !ops.contains_key(ComparisonOp::Regex.token()) {
                return Err(invalid(format!(
                    "{} on '{}' requires $regex",
                    OPTIONS_MODIFIER, field
                )));
            }
            if !operand.is_string() {
                return Err(invalid(format!("{} must be a string", OPTIONS_MODIFIER)));
            }
            continue;
        }

        let op = ComparisonOp::from_token(token)
            .ok_or_else(|| ValidationError::forbidden(token.as_str()))?;

        match op {
            ComparisonOp::In => {
                let items = operand
                    .as_array()
                    .ok_or_else(|| invalid(format!("$in on '{}' must hold an array", field)))?;
                for item in items {
                    check_literal(item, depth)?;
                }
            }
            ComparisonOp::Regex => {
                if !operand.is_string() {
                    return Err(invalid(format!("$regex on '{}' must be a string", field)));
                }
            }
            _ => check_literal(operand, depth)?,
        }
    }

    Ok(())
}

/// Literal operands may nest objects and arrays but never operators
fn check_literal(value: &Value, depth: usize) -> ValidationResult<()> {
    match value {
        Value::Object(map) => {
            let depth = descend(depth)?;
            for (key, v) in map {
                if key.starts_with('$') {
                    return Err(ValidationError::forbidden(key.as_str()));
                }
                check_literal(v, depth)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            let depth = descend(depth)?;
            for item in items {
                check_literal(item, depth)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Returns the only entry of a single-key object
fn single_entry(map: &Map<String, Value>) -> Option<(&String, &Value)> {
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Some(entry),
        _ => None,
    }
}

fn check_stage(index: usize, stage: &Value) -> ValidationResult<()> {
    let map = stage.as_object().ok_or_else(|| {
        invalid(format!(
            "stage #{} must be an object, got {}",
            index,
            json_kind(stage)
        ))
    })?;

    let (token, body) = single_entry(map).ok_or_else(|| {
        invalid(format!(
            "stage #{} must have exactly one key, found {}",
            index,
            map.len()
        ))
    })?;

    let stage = PipelineStage::from_token(token)
        .ok_or_else(|| ValidationError::forbidden(token.as_str()))?;

    match stage {
        PipelineStage::Match => check_filter_at(body, 1),
        PipelineStage::Group => check_group(body),
        PipelineStage::Sort => check_sort(body),
        PipelineStage::Limit | PipelineStage::Skip => {
            if body.as_u64().is_none() {
                return Err(invalid(format!(
                    "{} takes a non-negative integer",
                    stage.token()
                )));
            }
            Ok(())
        }
        PipelineStage::Project => check_project(body),
        PipelineStage::Count => match body.as_str() {
            Some(name) if !name.is_empty() && !name.starts_with('$') && !name.contains('.') => {
                Ok(())
            }
            _ => Err(invalid("$count takes a plain output field name")),
        },
        PipelineStage::Unwind => match body.as_str() {
            Some(path) if path.len() > 1 && path.starts_with('$') => Ok(()),
            _ => Err(invalid("$unwind takes a field path such as \"$tags\"")),
        },
    }
}

fn check_group(body: &Value) -> ValidationResult<()> {
    let map = body
        .as_object()
        .ok_or_else(|| invalid("$group takes an object"))?;

    let id = map
        .get("_id")
        .ok_or_else(|| invalid("$group requires an _id"))?;
    check_expression(id, 1)?;

    for (name, spec) in map {
        if name == "_id" {
            continue;
        }
        if name.starts_with('$') {
            return Err(ValidationError::forbidden(name.as_str()));
        }

        let (token, arg) = spec
            .as_object()
            .and_then(single_entry)
            .ok_or_else(|| {
                invalid(format!(
                    "group field '{}' must be a single accumulator object",
                    name
                ))
            })?;

        Accumulator::from_token(token)
            .ok_or_else(|| ValidationError::forbidden(token.as_str()))?;
        check_expression(arg, 1)?;
    }

    Ok(())
}

fn check_sort(body: &Value) -> ValidationResult<()> {
    let map = body
        .as_object()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| invalid("$sort takes a non-empty object"))?;

    for (field, direction) in map {
        if field.starts_with('$') {
            return Err(ValidationError::forbidden(field.as_str()));
        }
        if !matches!(direction.as_i64(), Some(1) | Some(-1)) {
            return Err(invalid(format!(
                "sort direction for '{}' must be 1 or -1",
                field
            )));
        }
    }

    Ok(())
}

fn check_project(body: &Value) -> ValidationResult<()> {
    let map = body
        .as_object()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| invalid("$project takes a non-empty object"))?;

    for (field, spec) in map {
        if field.starts_with('$') {
            return Err(ValidationError::forbidden(field.as_str()));
        }
        check_expression(spec, 1)?;
    }

    Ok(())
}

/// Expressions: literals, `"$field"` references, nested objects of
/// expressions, or a single date-part operator
fn check_expression(value: &Value, depth: usize) -> ValidationResult<()> {
    match value {
        Value::Object(map) => {
            let depth = descend(depth)?;
            if map.keys().any(|k| k.starts_with('$')) {
                let (token, arg) = single_entry(map).ok_or_else(|| {
                    invalid("operator expressions take exactly one operator")
                })?;
                DatePart::from_token(token)
                    .ok_or_else(|| ValidationError::forbidden(token.as_str()))?;
                check_expression(arg, depth)
            } else {
                map.values().try_for_each(|v| check_expression(v, depth))
            }
        }
        Value::Array(items) => {
            let depth = descend(depth)?;
            items.iter().try_for_each(|v| check_expression(v, depth))
        }
        _ => Ok(()),
    }
}
