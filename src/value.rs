//! # Runtime value type
//!
//! The evaluator, field generator, and instance generator all pass values
//! of this type around. Unlike the AST's `Literal`, a `Value` is a fully
//! realized runtime result — including the intermediate `Range` object
//! produced by evaluating a `Range` expression before it is resolved to a
//! concrete number (spec §4.H: "Range: yields an object {min,max}... a
//! random value is drawn only when embedded in a superposition or used as
//! dynamic cardinality").

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A signed duration in calendar units, the only value `Value::Date` can be
/// combined with arithmetically (spec §9, "Date arithmetic").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    pub days: i64,
}

impl Duration {
    pub fn days(n: i64) -> Self {
        Duration { days: n }
    }
}

/// A runtime Loom value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Decimal(f64),
    Str(String),
    Bool(bool),
    Date(NaiveDate),
    Duration(Duration),
    /// An unresolved `{min, max}` pair; only the superposition picker and
    /// dynamic cardinality resolution draw a concrete number from it.
    Range {
        min: Box<Value>,
        max: Box<Value>,
    },
    List(Vec<Value>),
    /// A generated instance or any other field→value record.
    Object(IndexMap<String, Value>),
    Null,
    /// A lenient-mode typed error value (spec §4.C "Failure modes": calling
    /// an unknown generator is fatal in strict mode, but in lenient mode
    /// produces a typed error value surfaced by the evaluator instead of
    /// aborting the whole run). Carries a short machine-readable reason.
    Error(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Date(_) => "date",
            Value::Duration(_) => "duration",
            Value::Range { .. } => "range",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Null => "null",
            Value::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Decimal(n) => Some(n.floor() as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Decimal(n) => Some(*n),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Int(n) => *n != 0,
            Value::Decimal(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(v) => !v.is_empty(),
            Value::Error(_) => false,
            _ => true,
        }
    }

    /// A stable string key used by [`crate::context::GenerationContext`]'s
    /// `uniqueValues` sets. Floats don't implement `Eq`/`Hash`, so rather
    /// than fight the orphan rules we key uniqueness off a canonical string
    /// form — the same technique the value membership checks in a schema
    /// validator use.
    pub fn unique_key(&self) -> String {
        match self {
            Value::Int(n) => format!("i:{n}"),
            Value::Decimal(n) => format!("d:{n}"),
            Value::Str(s) => format!("s:{s}"),
            Value::Bool(b) => format!("b:{b}"),
            Value::Date(d) => format!("dt:{d}"),
            Value::Duration(d) => format!("du:{}", d.days),
            Value::Null => "n:".to_string(),
            other => format!("x:{other:?}"),
        }
    }

    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Decimal(b)) => (*a as f64).partial_cmp(b),
            (Value::Decimal(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    pub fn values_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Int(a), Value::Decimal(b)) | (Value::Decimal(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a.days == b.days,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.values_equal(y))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Decimal(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Duration(d) => write!(f, "{}d", d.days),
            Value::Range { min, max } => write!(f, "{min}..{max}"),
            Value::List(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(_) => write!(f, "<object>"),
            Value::Null => write!(f, "null"),
            Value::Error(reason) => write!(f, "<error: {reason}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_key_distinguishes_types() {
        assert_ne!(Value::Int(1).unique_key(), Value::Str("1".into()).unique_key());
    }

    #[test]
    fn int_and_decimal_compare_across_types() {
        assert_eq!(
            Value::Int(3).partial_cmp_value(&Value::Decimal(3.0)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn truthy_matches_spec_semantics() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::Int(1).truthy());
        assert!(!Value::Str(String::new()).truthy());
    }
}
