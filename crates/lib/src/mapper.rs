//! Projection of flat configuration keys onto builder fields.

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, SynthError};
use crate::value::{ValueKind, type_name};

/// One `source_key -> target_key` projection with the kind the value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
  pub source: &'static str,
  pub target: &'static str,
  pub kind: ValueKind,
}

impl FieldMapping {
  pub const fn new(source: &'static str, target: &'static str, kind: ValueKind) -> Self {
    Self { source, target, kind }
  }

  /// A string-valued mapping, the common case.
  pub const fn string(source: &'static str, target: &'static str) -> Self {
    Self::new(source, target, ValueKind::String)
  }
}

/// Copy every configured source key into `output` under its target key.
///
/// Absent keys are skipped. A present key whose value is not of the mapping's
/// kind fails the whole projection; entries already written stay in `output`,
/// but callers discard it on error.
pub fn map_fields(config: &Config, output: &mut Map<String, Value>, mappings: &[FieldMapping]) -> Result<()> {
  for mapping in mappings {
    let Some(value) = config.get(mapping.source) else {
      continue;
    };

    if !mapping.kind.matches(value) {
      return Err(SynthError::SchemaType {
        key: mapping.source.to_string(),
        expected: mapping.kind,
        actual: type_name(value).to_string(),
      });
    }

    debug!(source = mapping.source, target = mapping.target, "mapped field");
    output.insert(mapping.target.to_string(), value.clone());
  }

  Ok(())
}
