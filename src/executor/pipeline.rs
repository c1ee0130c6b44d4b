//! Aggregation pipeline evaluation
//!
//! Stages run in order over an owned document vector. Each stage consumes
//! the output of the previous one.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::{json, Map, Value};

use crate::query::{Accumulator, DatePart, PipelineStage};

use super::errors::{StoreError, StoreResult};
use super::filters::{field_value, PredicateFilter};
use super::sorter::ResultSorter;

fn invalid(reason: impl Into<String>) -> StoreError {
    StoreError::InvalidPipeline(reason.into())
}

/// Runs every stage over `documents`
pub fn run_pipeline(mut documents: Vec<Value>, stages: &[Value]) -> StoreResult<Vec<Value>> {
    for (index, stage) in stages.iter().enumerate() {
        documents = apply_stage(index, stage, documents)?;
    }
    Ok(documents)
}

fn apply_stage(index: usize, stage: &Value, mut docs: Vec<Value>) -> StoreResult<Vec<Value>> {
    let (token, body) = stage
        .as_object()
        .and_then(single_entry)
        .ok_or_else(|| invalid(format!("stage #{} must be an object with one key", index)))?;

    let stage = PipelineStage::from_token(token)
        .ok_or_else(|| invalid(format!("unsupported stage {}", token)))?;

    match stage {
        PipelineStage::Match => {
            let filter = PredicateFilter::parse(body)?;
            docs.retain(|d| filter.matches(d));
            Ok(docs)
        }
        PipelineStage::Group => group(&docs, body),
        PipelineStage::Sort => {
            let keys = ResultSorter::parse_keys(body)?;
            ResultSorter::sort(&mut docs, &keys);
            Ok(docs)
        }
        PipelineStage::Limit => {
            docs.truncate(count_arg(stage, body)?);
            Ok(docs)
        }
        PipelineStage::Skip => {
            let n = count_arg(stage, body)?.min(docs.len());
            Ok(docs.split_off(n))
        }
        PipelineStage::Project => project(docs, body),
        PipelineStage::Count => {
            let name = body
                .as_str()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| invalid("$count takes a field name"))?;
            if docs.is_empty() {
                return Ok(Vec::new());
            }
            let mut out = Map::new();
            out.insert(name.to_string(), json!(docs.len()));
            Ok(vec![Value::Object(out)])
        }
        PipelineStage::Unwind => unwind(docs, body),
    }
}

fn single_entry(map: &Map<String, Value>) -> Option<(&String, &Value)> {
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Some(entry),
        _ => None,
    }
}

fn count_arg(stage: PipelineStage, body: &Value) -> StoreResult<usize> {
    body.as_u64()
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .ok_or_else(|| invalid(format!("{} takes a non-negative integer", stage.token())))
}

/// Evaluates an expression against one document: `"$path"` references,
/// date parts, nested objects and arrays, or literals.
pub(crate) fn evaluate(expr: &Value, doc: &Value) -> StoreResult<Value> {
    match expr {
        Value::String(s) if s.len() > 1 && s.starts_with('$') => {
            Ok(field_value(doc, &s[1..]).cloned().unwrap_or(Value::Null))
        }
        Value::Object(map) if map.keys().any(|k| k.starts_with('$')) => {
            let (token, arg) = single_entry(map)
                .ok_or_else(|| invalid("operator expressions take exactly one operator"))?;
            let part = DatePart::from_token(token)
                .ok_or_else(|| invalid(format!("unsupported expression operator {}", token)))?;
            Ok(date_part(part, &evaluate(arg, doc)?))
        }
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                out.insert(key.clone(), evaluate(value, doc)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| evaluate(v, doc))
            .collect::<StoreResult<Vec<_>>>()
            .map(Value::Array),
        literal => Ok(literal.clone()),
    }
}

fn date_part(part: DatePart, value: &Value) -> Value {
    let date = match value.as_str().and_then(parse_date) {
        Some(d) => d,
        None => return Value::Null,
    };
    match part {
        DatePart::Year => json!(date.year()),
        DatePart::Month => json!(date.month()),
        DatePart::DayOfMonth => json!(date.day()),
    }
}

/// Accepts RFC 3339 timestamps (read in UTC), naive timestamps and plain
/// `YYYY-MM-DD` dates
fn parse_date(text: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_utc().date())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
}

/// Running state of one accumulator within one group
enum AccState {
    Sum { int: i64, float: f64, saw_float: bool },
    Avg { total: f64, count: u64 },
    Min(Option<Value>),
    Max(Option<Value>),
    First(Option<Value>),
    Last(Option<Value>),
}

impl AccState {
    fn new(acc: Accumulator) -> Self {
        match acc {
            Accumulator::Sum => AccState::Sum {
                int: 0,
                float: 0.0,
                saw_float: false,
            },
            Accumulator::Avg => AccState::Avg {
                total: 0.0,
                count: 0,
            },
            Accumulator::Min => AccState::Min(None),
            Accumulator::Max => AccState::Max(None),
            Accumulator::First => AccState::First(None),
            Accumulator::Last => AccState::Last(None),
        }
    }

    fn push(&mut self, value: Value) {
        match self {
            AccState::Sum {
                int,
                float,
                saw_float,
            } => {
                if let Value::Number(n) = &value {
                    match n.as_i64().and_then(|i| int.checked_add(i)) {
                        Some(total) => *int = total,
                        None => {
                            *saw_float = true;
                            *float += n.as_f64().unwrap_or(0.0);
                        }
                    }
                }
            }
            AccState::Avg { total, count } => {
                if let Some(f) = value.as_f64() {
                    *total += f;
                    *count += 1;
                }
            }
            AccState::Min(current) => keep_extreme(current, value, Ordering::Less),
            AccState::Max(current) => keep_extreme(current, value, Ordering::Greater),
            AccState::First(current) => {
                if current.is_none() {
                    *current = Some(value);
                }
            }
            AccState::Last(current) => *current = Some(value),
        }
    }

    fn finish(self) -> Value {
        match self {
            AccState::Sum {
                int,
                float,
                saw_float,
            } => {
                if saw_float {
                    json!(int as f64 + float)
                } else {
                    json!(int)
                }
            }
            AccState::Avg { total, count } => {
                if count == 0 {
                    Value::Null
                } else {
                    json!(total / count as f64)
                }
            }
            AccState::Min(v) | AccState::Max(v) | AccState::First(v) | AccState::Last(v) => {
                v.unwrap_or(Value::Null)
            }
        }
    }
}

/// Nulls and missing values never win `$min`/`$max`
fn keep_extreme(current: &mut Option<Value>, candidate: Value, wanted: Ordering) {
    if candidate.is_null() {
        return;
    }
    let replace = match current {
        Some(existing) => {
            ResultSorter::compare_values(Some(&candidate), Some(existing)) == wanted
        }
        None => true,
    };
    if replace {
        *current = Some(candidate);
    }
}

/// Groups in first-seen key order
fn group(docs: &[Value], body: &Value) -> StoreResult<Vec<Value>> {
    let spec = body
        .as_object()
        .ok_or_else(|| invalid("$group takes an object"))?;
    let id_expr = spec
        .get("_id")
        .ok_or_else(|| invalid("$group requires an _id"))?;

    let mut fields = Vec::new();
    for (name, acc_spec) in spec {
        if name == "_id" {
            continue;
        }
        let (token, arg) = acc_spec
            .as_object()
            .and_then(single_entry)
            .ok_or_else(|| invalid(format!("group field '{}' needs one accumulator", name)))?;
        let acc = Accumulator::from_token(token)
            .ok_or_else(|| invalid(format!("unsupported accumulator {}", token)))?;
        fields.push((name.clone(), acc, arg));
    }

    let mut groups: Vec<(Value, Vec<AccState>)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for doc in docs {
        let key = evaluate(id_expr, doc)?;
        let slot = match slots.get(&key.to_string()) {
            Some(slot) => *slot,
            None => {
                slots.insert(key.to_string(), groups.len());
                let states = fields.iter().map(|(_, acc, _)| AccState::new(*acc)).collect();
                groups.push((key, states));
                groups.len() - 1
            }
        };

        for ((_, _, arg), state) in fields.iter().zip(groups[slot].1.iter_mut()) {
            state.push(evaluate(arg, doc)?);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, states)| {
            let mut out = Map::new();
            out.insert("_id".to_string(), key);
            for ((name, _, _), state) in fields.iter().zip(states) {
                out.insert(name.clone(), state.finish());
            }
            Value::Object(out)
        })
        .collect())
}

fn projection_flag(rule: &Value) -> Option<bool> {
    match rule {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        _ => None,
    }
}

fn project(docs: Vec<Value>, body: &Value) -> StoreResult<Vec<Value>> {
    let spec = body
        .as_object()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| invalid("$project takes a non-empty object"))?;

    let mut include_id = true;
    let mut excluded = Vec::new();
    let mut included = Vec::new();
    let mut computed = Vec::new();

    for (path, rule) in spec {
        match projection_flag(rule) {
            Some(false) if path == "_id" => include_id = false,
            Some(true) if path == "_id" => {}
            Some(false) => excluded.push(path.as_str()),
            Some(true) => included.push(path.as_str()),
            None => computed.push((path.as_str(), rule)),
        }
    }

    if !excluded.is_empty() && !(included.is_empty() && computed.is_empty()) {
        return Err(invalid("$project cannot mix inclusion and exclusion"));
    }
    let exclusion_mode = included.is_empty() && computed.is_empty();

    docs.into_iter()
        .map(|doc| {
            if exclusion_mode {
                let mut out = doc;
                if let Value::Object(map) = &mut out {
                    for path in &excluded {
                        remove_path(map, path);
                    }
                    if !include_id {
                        map.shift_remove("_id");
                    }
                }
                return Ok(out);
            }

            let mut out = Map::new();
            if include_id {
                if let Some(id) = doc.get("_id") {
                    out.insert("_id".to_string(), id.clone());
                }
            }
            for path in &included {
                if let Some(value) = field_value(&doc, path) {
                    set_path(&mut out, path, value.clone());
                }
            }
            for (path, rule) in &computed {
                set_path(&mut out, path, evaluate(rule, &doc)?);
            }
            Ok(Value::Object(out))
        })
        .collect()
}

fn unwind(docs: Vec<Value>, body: &Value) -> StoreResult<Vec<Value>> {
    let path = body
        .as_str()
        .and_then(|p| p.strip_prefix('$'))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid("$unwind takes a field path such as \"$tags\""))?;

    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let items = match field_value(&doc, path) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => items.clone(),
            Some(_) => {
                out.push(doc);
                continue;
            }
        };
        for item in items {
            let mut copy = doc.clone();
            if let Value::Object(map) = &mut copy {
                set_path(map, path, item);
            }
            out.push(copy);
        }
    }
    Ok(out)
}

fn set_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                set_path(map, rest, value);
            }
        }
    }
}

fn remove_path(target: &mut Map<String, Value>, path: &str) {
    match path.split_once('.') {
        None => {
            target.shift_remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::Object(child)) = target.get_mut(head) {
                remove_path(child, rest);
            }
        }
    }
}
