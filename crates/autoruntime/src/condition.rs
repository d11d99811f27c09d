//! Boolean predicates evaluated by condition nodes.
//!
//! A condition config is `{field, operator, value}`. `field` is a dot path
//! into the execution context. Evaluation never fails: an unknown operator
//! or a config missing any of the three keys evaluates to `false`.

use autocore::value::lookup_path;
use autocore::{Config, Context, ValueExt};
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "contains" => Ok(Self::Contains),
            "greater_than" => Ok(Self::GreaterThan),
            "less_than" => Ok(Self::LessThan),
            "is_empty" => Ok(Self::IsEmpty),
            "is_not_empty" => Ok(Self::IsNotEmpty),
            _ => Err(()),
        }
    }
}

impl Operator {
    pub fn apply(&self, actual: &Value, expected: &Value) -> bool {
        match self {
            Self::Equals => actual.loose_eq(expected),
            Self::NotEquals => !actual.loose_eq(expected),
            Self::Contains => actual
                .coerce_string()
                .contains(expected.coerce_string().as_str()),
            Self::GreaterThan => actual.loose_cmp(expected) == Some(Ordering::Greater),
            Self::LessThan => actual.loose_cmp(expected) == Some(Ordering::Less),
            Self::IsEmpty => actual.is_blank(),
            Self::IsNotEmpty => !actual.is_blank(),
        }
    }
}

/// Evaluate a condition node config against the execution context.
pub fn evaluate(config: &Config, context: &Context) -> bool {
    let (Some(field), Some(operator), Some(expected)) = (
        config.get("field").and_then(Value::as_str),
        config.get("operator").and_then(Value::as_str),
        config.get("value"),
    ) else {
        tracing::warn!("Incomplete condition config, evaluating to false");
        return false;
    };

    let Ok(operator) = operator.parse::<Operator>() else {
        tracing::warn!("Unknown condition operator '{}', evaluating to false", operator);
        return false;
    };

    let actual = lookup_path(context, field).unwrap_or(&Value::Null);
    operator.apply(actual, expected)
}
