//! Value kinds and truthiness for configuration values.
//!
//! Configuration values use the JSON data model. Type checks compare a value
//! against a [`ValueKind`] rather than a Rust type, since the expected kind of
//! a key is only known from the schema tables.

use std::fmt;

use serde_json::Value;

/// The closed set of value kinds a schema can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
  String,
  Int,
  Bool,
  List,
  Map,
}

impl ValueKind {
  /// Returns the kind of a value, or `None` for null and floating point numbers.
  pub fn of(value: &Value) -> Option<ValueKind> {
    match value {
      Value::String(_) => Some(ValueKind::String),
      Value::Number(n) if n.is_i64() || n.is_u64() => Some(ValueKind::Int),
      Value::Bool(_) => Some(ValueKind::Bool),
      Value::Array(_) => Some(ValueKind::List),
      Value::Object(_) => Some(ValueKind::Map),
      _ => None,
    }
  }

  pub fn matches(self, value: &Value) -> bool {
    ValueKind::of(value) == Some(self)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      ValueKind::String => "str",
      ValueKind::Int => "int",
      ValueKind::Bool => "bool",
      ValueKind::List => "list",
      ValueKind::Map => "dict",
    }
  }
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Type name of an arbitrary value, as shown in error messages.
pub fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Number(n) if n.is_f64() => "float",
    other => ValueKind::of(other).map(ValueKind::as_str).unwrap_or("unknown"),
  }
}

/// Null, `false`, zero, and empty strings, lists and maps are falsy.
pub fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}
