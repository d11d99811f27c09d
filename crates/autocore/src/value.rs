//! Loose comparison helpers over JSON context values.

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Resolve a dot-separated path against a context map.
///
/// Objects are descended by key and arrays by numeric index. A missing
/// segment at any depth yields `None`.
pub fn lookup_path<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Comparison semantics used by condition nodes
pub trait ValueExt {
    /// Null, `""`, empty array or object, `false` and zero.
    fn is_blank(&self) -> bool;

    /// Numeric view: numbers, and strings that parse as numbers.
    fn to_number(&self) -> Option<f64>;

    /// String view used by substring tests.
    fn coerce_string(&self) -> String;

    /// Equality across types: numeric strings equal numbers, booleans
    /// compare by truthiness, null equals any blank value.
    fn loose_eq(&self, other: &Value) -> bool;

    /// Ordering between two numbers or two strings, `None` otherwise.
    fn loose_cmp(&self, other: &Value) -> Option<Ordering>;
}

impl ValueExt for Value {
    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
        }
    }

    fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn coerce_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, v) | (v, Value::Null) => v.is_blank(),
            (Value::Bool(b), v) | (v, Value::Bool(b)) => *b == !v.is_blank(),
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                match (self.to_number(), other.to_number()) {
                    (Some(a), Some(b)) => a == b,
                    _ => self.coerce_string() == other.coerce_string(),
                }
            }
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (a, b) => a == b,
        }
    }

    fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.to_number(), other.to_number()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> Map<String, Value> {
        json!({
            "booking": { "status": "confirmed", "guests": [ { "name": "Ada" } ] },
            "count": 3
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn lookup_descends_objects_and_arrays() {
        let ctx = context();
        assert_eq!(lookup_path(&ctx, "booking.status"), Some(&json!("confirmed")));
        assert_eq!(lookup_path(&ctx, "booking.guests.0.name"), Some(&json!("Ada")));
        assert_eq!(lookup_path(&ctx, "count"), Some(&json!(3)));
    }

    #[test]
    fn lookup_missing_segment_is_none() {
        let ctx = context();
        assert_eq!(lookup_path(&ctx, "booking.missing.deeper"), None);
        assert_eq!(lookup_path(&ctx, "count.nested"), None);
        assert_eq!(lookup_path(&ctx, ""), None);
    }

    #[test]
    fn blank_values() {
        for v in [json!(null), json!(""), json!([]), json!({}), json!(false), json!(0), json!(0.0)] {
            assert!(v.is_blank(), "{v} should be blank");
        }
        for v in [json!("x"), json!([1]), json!(true), json!(2)] {
            assert!(!v.is_blank(), "{v} should not be blank");
        }
    }

    #[test]
    fn loose_equality_crosses_types() {
        assert!(json!("5").loose_eq(&json!(5)));
        assert!(json!("5.0").loose_eq(&json!(5)));
        assert!(json!(5).loose_eq(&json!(" 5 ")));
        assert!(!json!("5.1").loose_eq(&json!(5)));
        assert!(json!(5.0).loose_eq(&json!(5)));
        assert!(json!(null).loose_eq(&json!("")));
        assert!(json!(true).loose_eq(&json!("yes")));
        assert!(!json!("confirmed").loose_eq(&json!("pending")));
    }

    #[test]
    fn ordering_requires_comparable_values() {
        assert_eq!(json!("10").loose_cmp(&json!(9)), Some(Ordering::Greater));
        assert_eq!(json!("a").loose_cmp(&json!("b")), Some(Ordering::Less));
        assert_eq!(json!({}).loose_cmp(&json!(1)), None);
    }
}
