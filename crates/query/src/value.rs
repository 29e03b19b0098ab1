//! Typed filter values and coercion from raw strings.

use core::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::schema::{FieldKind, IntWidth};

/// Literal meaning "unset" inside `IN` / `NOT_IN` value lists.
pub const NOT_ASSIGNED: &str = "Not Assigned";

/// Format reported when a timestamp value fails to parse.
pub const TIMESTAMP_FORMAT: &str = "yyyy-MM-dd'T'HH:mm:ss.SSSXXX";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce a raw filter value to the field's declared kind.
    pub fn coerce(kind: &FieldKind, raw: &str) -> QueryResult<Value> {
        match kind {
            FieldKind::Text => Ok(Value::Text(raw.to_string())),
            FieldKind::Identifier => Uuid::parse_str(raw)
                .map(Value::Uuid)
                .map_err(|_| QueryError::invalid_value(raw, "UUID")),
            FieldKind::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(QueryError::invalid_value(raw, "true or false"))
                }
            }
            FieldKind::Integer(IntWidth::Int32) => raw
                .parse::<i32>()
                .map(|v| Value::Int(i64::from(v)))
                .map_err(|_| QueryError::invalid_value(raw, "32-bit integer")),
            FieldKind::Integer(IntWidth::Int64) => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| QueryError::invalid_value(raw, "64-bit integer")),
            FieldKind::Float => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Value::Float(v)),
                _ => Err(QueryError::invalid_value(raw, "decimal number")),
            },
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|_| QueryError::invalid_value(raw, TIMESTAMP_FORMAT)),
            FieldKind::Enumeration(variants) => {
                if variants.contains(&raw) {
                    Ok(Value::Text(raw.to_string()))
                } else {
                    Err(QueryError::invalid_value(
                        raw,
                        format!("one of [{}]", variants.join(", ")),
                    ))
                }
            }
            FieldKind::Relation(_) => Err(QueryError::invalid_value(raw, "a scalar field")),
        }
    }

    /// Text form used by `LIKE`. `None` for null.
    /// Text form used by `LIKE`. The SQL compiler renders columns the same
    /// way, so both backends agree on which rows match.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Uuid(v) => Some(v.to_string()),
            Value::Text(v) => Some(v.clone()),
            Value::Bool(v) => Some(v.to_string()),
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339_opts(SecondsFormat::Micros, false)),
        }
    }

    /// Ordering between two non-null values of compatible kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
