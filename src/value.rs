//! Runtime values shared by the scanner, interpreter and bytecode constant pools.

use std::fmt;

use crate::error::ValueError;

/// A heap object. Only strings exist; their lifetime is plain Rust ownership.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    String(String),
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::String(s) => write!(f, "{}", s),
        }
    }
}

/// A tagged runtime value.
///
/// Equality is variant-wise: `Int(1)` and `Double(1.0)` are never equal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Double(f64),
    Bool(bool),
    Object(Object),
    Nil,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Object(Object::String(s.into()))
    }

    /// Only `nil` and `false` are falsey.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::Object(Object::String(_)) => "string",
            Value::Nil => "nil",
        }
    }

    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(ValueError::new("int", other.type_name())),
        }
    }

    pub fn as_double(&self) -> Result<f64, ValueError> {
        match self {
            Value::Double(n) => Ok(*n),
            other => Err(ValueError::new("double", other.type_name())),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ValueError::new("bool", other.type_name())),
        }
    }

    pub fn as_string(&self) -> Result<&str, ValueError> {
        match self {
            Value::Object(Object::String(s)) => Ok(s),
            other => Err(ValueError::new("string", other.type_name())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            // Debug formatting keeps the fractional part: 7.0, not 7
            Value::Double(n) => write!(f, "{:?}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Object(obj) => write!(f, "{}", obj),
            Value::Nil => write!(f, "nil"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn test_cross_variant_equality() {
        assert_ne!(Value::Int(1), Value::Double(1.0));
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_eq!(Value::string("a"), Value::from("a"));
    }

    #[test]
    fn test_typed_accessors() {
        assert_eq!(Value::Int(3).as_int().unwrap(), 3);
        assert_eq!(Value::string("hi").as_string().unwrap(), "hi");

        let err = Value::Nil.as_int().unwrap_err();
        assert_eq!(err.expected, "int");
        assert_eq!(err.found, "nil");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(7).to_string(), "7");
        assert_eq!(Value::Double(7.0).to_string(), "7.0");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::string("abc").to_string(), "abc");
        assert_eq!(Value::Nil.to_string(), "nil");
    }
}
