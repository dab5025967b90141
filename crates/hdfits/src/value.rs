//! Scalar header values.
//!
//! Header entries carry one scalar each. The container stores attributes as
//! typed arrays, so a value is written as a one-element array of the matching
//! element type and read back from the first element.

use core::fmt;

use crate::container::AttrValue;

/// A header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Logical value (`T` or `F`).
    Logical(bool),
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Float(f64),
    /// Character string.
    String(String),
}

impl Value {
    /// Returns the string content if this is a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content if this is an `Integer` value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns a numeric view of `Integer` and `Float` values.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Wrap this value as a single-element attribute array.
    pub fn to_attr(&self) -> AttrValue {
        match self {
            Value::Logical(b) => AttrValue::Bool(vec![*b]),
            Value::Integer(n) => AttrValue::Int(vec![*n]),
            Value::Float(f) => AttrValue::Float(vec![*f]),
            Value::String(s) => AttrValue::Text(vec![s.clone()]),
        }
    }

    /// Take the first element of an attribute array, or `None` if it is empty.
    pub fn from_attr(attr: &AttrValue) -> Option<Value> {
        match attr {
            AttrValue::Bool(v) => v.first().map(|b| Value::Logical(*b)),
            AttrValue::Int(v) => v.first().map(|n| Value::Integer(*n)),
            AttrValue::Float(v) => v.first().map(|f| Value::Float(*f)),
            AttrValue::Text(v) => v.first().map(|s| Value::String(s.clone())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Logical(true) => write!(f, "T"),
            Value::Logical(false) => write!(f, "F"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::String(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_wraps_single_element() {
        assert_eq!(Value::Integer(7).to_attr(), AttrValue::Int(vec![7]));
        assert_eq!(
            Value::String("Smith".into()).to_attr(),
            AttrValue::Text(vec!["Smith".into()])
        );
        assert_eq!(Value::Logical(true).to_attr(), AttrValue::Bool(vec![true]));
    }

    #[test]
    fn from_attr_takes_first_element() {
        let attr = AttrValue::Float(vec![2.5, 9.0]);
        assert_eq!(Value::from_attr(&attr), Some(Value::Float(2.5)));
    }

    #[test]
    fn from_empty_attr_is_none() {
        assert_eq!(Value::from_attr(&AttrValue::Text(vec![])), None);
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Integer(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(1.5).as_integer(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Logical(false).to_string(), "F");
        assert_eq!(Value::Integer(-4).to_string(), "-4");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::from("Jy").to_string(), "'Jy'");
    }
}
