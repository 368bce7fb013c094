//! Runtime value types

use serde::{Deserialize, Serialize};
use std::fmt;

/* ===================== Values ===================== */

/// Runtime value
///
/// Every variable, literal and expression result is one of these three kinds.
/// Integers that overflow during arithmetic are promoted to `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Boolean result of a comparison or logical operator
    pub fn from_bool(b: bool) -> Self {
        Value::Integer(if b { 1 } else { 0 })
    }

    /// Truthiness: non-zero numbers and non-empty text are true
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Name of the value kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }

    /// Numeric view of the value
    ///
    /// Text is coerced when it parses as a number; otherwise `None`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => match Value::parse_number(s)? {
                Value::Integer(i) => Some(i as f64),
                Value::Float(f) => Some(f),
                Value::Text(_) => None,
            },
        }
    }

    /// Integer view of the value, truncating floats toward zero
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            other => {
                let f = other.to_f64()?;
                if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f.trunc() as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Numeric coercion of the value, keeping integers as integers
    pub fn to_number(&self) -> Option<Value> {
        match self {
            Value::Integer(_) | Value::Float(_) => Some(self.clone()),
            Value::Text(s) => Value::parse_number(s),
        }
    }

    /// Parse text as an integer, then as a float
    pub fn parse_number(text: &str) -> Option<Value> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(Value::Integer(i));
        }
        match trimmed.parse::<f64>() {
            // Rust accepts "inf" and "NaN"; program text never means those
            Ok(f) if f.is_finite() => Some(Value::Float(f)),
            _ => None,
        }
    }

    /// Interpret a line of user input: integer, then float, then text
    pub fn parse_input(text: &str) -> Value {
        Value::parse_number(text).unwrap_or_else(|| Value::Text(text.trim().to_string()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
