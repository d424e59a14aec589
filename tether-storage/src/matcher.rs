//! Criteria evaluation and value ordering for in-memory stores.

use std::cmp::Ordering;

use serde_json::{Number, Value};
use tether_core::{is_operator_map, Criteria, Direction, Document, SortKey};

/// True when `doc` satisfies every entry of `criteria`.
pub fn matches(doc: &Document, criteria: &Criteria) -> bool {
    criteria
        .iter()
        .all(|(key, expected)| matches_field(doc.get(key).as_ref(), expected))
}

fn matches_field(actual: Option<&Value>, expected: &Value) -> bool {
    match expected {
        Value::Object(ops) if is_operator_map(expected) => ops
            .iter()
            .all(|(op, arg)| apply_operator(actual, op, arg)),
        _ => values_equal(actual, expected),
    }
}

fn apply_operator(actual: Option<&Value>, op: &str, arg: &Value) -> bool {
    match op {
        "$in" => arg
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(actual, item))),
        "$nin" => arg
            .as_array()
            .is_some_and(|items| !items.iter().any(|item| values_equal(actual, item))),
        "$ne" => !values_equal(actual, arg),
        "$gt" => compare_present(actual, arg).is_some_and(Ordering::is_gt),
        "$gte" => compare_present(actual, arg).is_some_and(Ordering::is_ge),
        "$lt" => compare_present(actual, arg).is_some_and(Ordering::is_lt),
        "$lte" => compare_present(actual, arg).is_some_and(Ordering::is_le),
        "$exists" => arg.as_bool().is_some_and(|wanted| wanted == actual.is_some()),
        unknown => {
            tracing::warn!(operator = unknown, "Unsupported criteria operator, no match");
            false
        }
    }
}

/// Equality with store semantics: `null` matches a missing attribute, an
/// array attribute matches any of its elements, numbers compare by value.
fn values_equal(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None, Value::Null) => true,
        (None, _) => false,
        (Some(Value::Array(items)), expected) if !expected.is_array() => items
            .iter()
            .any(|item| compare_values(item, expected) == Ordering::Equal),
        (Some(actual), expected) => compare_values(actual, expected) == Ordering::Equal,
    }
}

/// Range comparison only between values of the same kind.
fn compare_present(actual: Option<&Value>, arg: &Value) -> Option<Ordering> {
    let actual = actual?;
    if type_rank(actual) != type_rank(arg) {
        return None;
    }
    Some(compare_values(actual, arg))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order over JSON values: kinds are ranked first, then compared
/// within the kind.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = compare_values(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Integers compare exactly; `f64` is only used when a float is involved.
fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x.cmp(&y);
    }
    if x.is_f64() || y.is_f64() {
        let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    // a negative i64 against a u64 above i64::MAX
    if x.as_i64().is_some() {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Compare two documents by a list of sort keys. Missing attributes sort
/// as `null`.
pub fn compare_documents(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let left = a.get(&key.field).unwrap_or(Value::Null);
        let right = b.get(&key.field).unwrap_or(Value::Null);
        let ord = compare_values(&left, &right);
        let ord = match key.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
