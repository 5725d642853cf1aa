//! Condition matching logic and helper functions.

use std::cmp::Ordering;

use super::Condition;
use serde_json::Value;

impl Condition {
    /// Evaluates the condition against a document.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Term { field, value } => any_leaf(doc, field, |v| values_equal(v, value)),
            Self::Terms { field, values } => {
                any_leaf(doc, field, |v| values.iter().any(|val| values_equal(v, val)))
            }
            Self::Prefix { field, value } => {
                any_leaf(doc, field, |v| v.as_str().is_some_and(|s| s.starts_with(value.as_str())))
            }
            Self::Contains { field, value } => {
                any_leaf(doc, field, |v| v.as_str().is_some_and(|s| s.contains(value.as_str())))
            }
            Self::Range { field, gt, gte, lt, lte } => any_leaf(doc, field, |v| {
                bound(v, gt.as_ref(), |o| o == Ordering::Greater)
                    && bound(v, gte.as_ref(), |o| o != Ordering::Less)
                    && bound(v, lt.as_ref(), |o| o == Ordering::Less)
                    && bound(v, lte.as_ref(), |o| o != Ordering::Greater)
            }),
            Self::Exists { field } => get_field(doc, field).is_some_and(|v| match v {
                Value::Null => false,
                Value::Array(items) => !items.is_empty(),
                _ => true,
            }),
            Self::And { conditions } => conditions.iter().all(|c| c.matches(doc)),
            Self::Or { conditions } => conditions.iter().any(|c| c.matches(doc)),
            Self::Not { condition } => !condition.matches(doc),
        }
    }
}

fn any_leaf(doc: &Value, field: &str, pred: impl Fn(&Value) -> bool) -> bool {
    match get_field(doc, field) {
        Some(Value::Array(items)) => items.iter().any(&pred),
        Some(v) => pred(v),
        None => false,
    }
}

fn bound(v: &Value, limit: Option<&Value>, accept: impl Fn(Ordering) -> bool) -> bool {
    limit.is_none_or(|limit| compare_values(v, limit).is_some_and(&accept))
}

/// Gets a field from a JSON document, supporting dot notation and numeric
/// array indices.
pub(crate) fn get_field<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    let mut current = doc;
    for part in field.split('.') {
        current = match current {
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => current.get(part)?,
        };
    }
    Some(current)
}

/// Compares two JSON values for equality.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .is_some_and(|(a, b)| (a - b).abs() < f64::EPSILON),
        _ => a == b,
    }
}

/// Orders two JSON values; `None` if they are not comparable.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
