//! Provisioner declaration validation.
//!
//! Each entry of the `provisioners` configuration list is checked against the
//! field schema of its `type`. Defaults are resolved, transforms applied, and
//! the per-type post-processing hook run. A declaration carrying any key the
//! schema does not name is rejected.

mod schema;

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, SynthError, ValidationError};
use crate::json;
use crate::value::{is_truthy, type_name};

pub use schema::{FieldDef, ProvisionerKind, Transform};

/// Validate one declaration against `kind`'s schema.
pub fn validate(kind: ProvisionerKind, declaration: &Map<String, Value>, config: &Config) -> Result<Map<String, Value>> {
  let mut output = Map::new();
  let mut unconsumed: BTreeSet<&str> = declaration
    .keys()
    .map(String::as_str)
    .filter(|k| *k != "type")
    .collect();

  for field in kind.fields() {
    let default = field
      .default
      .map(|d| config.expand(&Value::String(d.to_string())))
      .transpose()?;

    // A declared null does not fall back to the default and stays unconsumed.
    let value = match declaration.get(field.name) {
      Some(Value::Null) => None,
      Some(declared) => Some(declared.clone()),
      None => default,
    };

    let value = match value {
      Some(v) if field.kind.matches(&v) => Some(apply_transform(field.transform, v, config)?),
      other => {
        let actual = other.as_ref().map(type_name).unwrap_or("");
        if field.required || other.as_ref().is_some_and(is_truthy) {
          return Err(
            ValidationError::InvalidValue {
              name: field.name.to_string(),
              actual: actual.to_string(),
              expected: field.kind,
            }
            .into(),
          );
        }
        None
      }
    };

    if let Some(value) = value.filter(is_truthy) {
      output.insert(field.name.to_string(), value);
      unconsumed.remove(field.name);
    }
  }

  if !unconsumed.is_empty() {
    return Err(
      ValidationError::Unrecognized {
        provisioner: kind.type_name().to_string(),
        keys: unconsumed.into_iter().map(str::to_string).collect(),
      }
      .into(),
    );
  }

  kind.post_process(&mut output);

  let mut entry = Map::new();
  entry.insert("type".to_string(), Value::String(kind.type_name().to_string()));
  entry.extend(output);
  Ok(entry)
}

fn apply_transform(transform: Option<Transform>, value: Value, config: &Config) -> Result<Value> {
  match transform {
    None => Ok(value),
    Some(Transform::ExpandedJson) => {
      let expanded = config.expand(&value)?;
      Ok(Value::String(json::to_spaced_string(&expanded)?))
    }
  }
}

/// Validate every declaration in the `provisioners` configuration list.
pub fn synthesize(config: &Config) -> Result<Vec<Value>> {
  let Some(declared) = config.get("provisioners").filter(|v| is_truthy(v)) else {
    return Ok(Vec::new());
  };

  let Value::Array(declarations) = declared else {
    return Err(ValidationError::ProvisionersNotList(type_name(declared).to_string()).into());
  };

  let mut provisioners = Vec::with_capacity(declarations.len());
  for declaration in declarations {
    let Value::Object(declaration) = declaration else {
      return Err(ValidationError::DeclarationNotMapping(type_name(declaration).to_string()).into());
    };

    let declared_type = declaration.get("type").and_then(Value::as_str).unwrap_or_default();
    let kind = ProvisionerKind::from_type(declared_type)
      .ok_or_else(|| SynthError::UnknownProvisionerType(declared_type.to_string()))?;

    debug!(provisioner = kind.type_name(), "validating provisioner");
    provisioners.push(Value::Object(validate(kind, declaration, config)?));
  }

  info!(count = provisioners.len(), "provisioners validated");
  Ok(provisioners)
}
