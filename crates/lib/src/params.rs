//! Parameter reference parsing and expansion.
//!
//! Configuration strings may reference other configuration values, which are
//! substituted when the configuration is loaded and when provisioner defaults
//! are resolved.
//!
//! # Reference Formats
//!
//! - `(( name ))` - the value of configuration key `name`
//! - `(( env:NAME ))` - the environment variable `NAME`
//!
//! Whitespace inside the parentheses is optional. Substituted text is expanded
//! again, so a key may reference a key that itself holds references. Chains
//! deeper than [`MAX_DEPTH`] are reported as a cycle.
//!
//! # Shell Syntax
//!
//! Only identifiers (`[A-Za-z_][A-Za-z0-9_]*`) form references. Any other
//! `((...))`, such as shell arithmetic `$((1 + 2))`, and an unclosed `((` are
//! copied through unchanged, so shell provisioners need no escaping.
//!
//! # Example
//!
//! ```
//! use packermate_lib::params::{parse, Param, Segment};
//!
//! let segments = parse("box-(( version )).ovf");
//! assert_eq!(segments, vec![
//!     Segment::Literal("box-".to_string()),
//!     Segment::Param(Param::Key("version".to_string())),
//!     Segment::Literal(".ovf".to_string()),
//! ]);
//! ```

use serde_json::Value;
use thiserror::Error;

/// Maximum nesting of references inside substituted values.
pub const MAX_DEPTH: usize = 8;

const OPEN: &str = "((";
const CLOSE: &str = "))";

/// A parsed parameter reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
  /// `(( name ))` - a configuration key
  Key(String),

  /// `(( env:NAME ))` - an environment variable
  Env(String),
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Param(Param),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
  #[error("unknown parameter: '{0}'")]
  UnknownKey(String),

  #[error("environment variable not set: '{0}'")]
  UnsetEnv(String),

  #[error("parameter references nested too deeply (cycle?) at '{0}'")]
  Cycle(String),
}

/// Source of values for parameter references.
pub trait Lookup {
  /// Resolve a configuration key to its textual value.
  fn lookup_key(&self, name: &str) -> Option<String>;

  /// Resolve an environment variable.
  fn lookup_env(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }
}

/// Parse a string into literal text and parameter references.
///
/// A `((` only opens a reference when the text up to the next `))` is an
/// identifier or `env:` followed by one. Anything else is literal text.
pub fn parse(input: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(start) = rest.find(OPEN) {
    let body_start = start + OPEN.len();
    let reference = rest[body_start..]
      .find(CLOSE)
      .and_then(|end| parse_reference(&rest[body_start..body_start + end]).map(|p| (p, body_start + end + CLOSE.len())));

    match reference {
      Some((param, consumed)) => {
        literal.push_str(&rest[..start]);
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Param(param));
        rest = &rest[consumed..];
      }
      None => {
        // step past one paren so `(((name))` still finds its reference
        literal.push_str(&rest[..start + 1]);
        rest = &rest[start + 1..];
      }
    }
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  segments
}

fn has_reference(text: &str) -> bool {
  text.contains(OPEN) && parse(text).iter().any(|s| matches!(s, Segment::Param(_)))
}

fn parse_reference(body: &str) -> Option<Param> {
  let body = body.trim();
  match body.strip_prefix("env:") {
    Some(var) => {
      let var = var.trim();
      is_identifier(var).then(|| Param::Env(var.to_string()))
    }
    None => is_identifier(body).then(|| Param::Key(body.to_string())),
  }
}

fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Expand every reference in a string.
///
/// # Errors
///
/// Returns an error if a reference cannot be resolved or the substitution
/// chain exceeds [`MAX_DEPTH`].
pub fn expand_str(input: &str, lookup: &dyn Lookup) -> Result<String, ParamError> {
  expand_at_depth(input, lookup, 0)
}

fn expand_at_depth(input: &str, lookup: &dyn Lookup, depth: usize) -> Result<String, ParamError> {
  let mut result = String::with_capacity(input.len());

  for segment in parse(input) {
    match segment {
      Segment::Literal(text) => result.push_str(&text),
      Segment::Param(param) => {
        let (name, resolved) = match &param {
          Param::Key(name) => (name, lookup.lookup_key(name).ok_or_else(|| ParamError::UnknownKey(name.clone()))?),
          Param::Env(name) => (name, lookup.lookup_env(name).ok_or_else(|| ParamError::UnsetEnv(name.clone()))?),
        };

        if has_reference(&resolved) {
          if depth + 1 >= MAX_DEPTH {
            return Err(ParamError::Cycle(name.clone()));
          }
          result.push_str(&expand_at_depth(&resolved, lookup, depth + 1)?);
        } else {
          result.push_str(&resolved);
        }
      }
    }
  }

  Ok(result)
}

/// Expand references in every string inside a value, recursing into lists and maps.
pub fn expand_value(value: &Value, lookup: &dyn Lookup) -> Result<Value, ParamError> {
  Ok(match value {
    Value::String(s) => Value::String(expand_str(s, lookup)?),
    Value::Array(items) => Value::Array(items.iter().map(|v| expand_value(v, lookup)).collect::<Result<_, _>>()?),
    Value::Object(map) => Value::Object(
      map
        .iter()
        .map(|(k, v)| Ok((k.clone(), expand_value(v, lookup)?)))
        .collect::<Result<_, ParamError>>()?,
    ),
    other => other.clone(),
  })
}

/// Textual form of a value when substituted into a string.
pub fn to_param_text(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}
