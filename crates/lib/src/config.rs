//! Layered build configuration.
//!
//! A [`Config`] is a flat mapping from keys to JSON-model values. It is built
//! from three layers, later layers overriding earlier ones:
//!
//! 1. the bundled defaults (`data/defaults.yml`)
//! 2. the user's YAML file
//! 3. `key=value` overrides from the command line
//!
//! After layering, [`Config::expand_all`] substitutes `(( name ))` references in
//! every string value. Keys holding `null` are treated as absent.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::params::{self, Lookup, ParamError};
use crate::value::is_truthy;

const DEFAULTS_YAML: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/defaults.yml"));

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse {origin}: {source}")]
  Parse { origin: String, source: serde_yaml::Error },

  #[error("top level of {origin} must be a mapping")]
  NotMapping { origin: String },

  #[error("invalid override '{0}': expected key=value")]
  InvalidOverride(String),

  #[error("failed to expand '{key}': {source}")]
  Expand { key: String, source: ParamError },
}

/// The working configuration for one synthesis pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
  values: Map<String, Value>,
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_map(values: Map<String, Value>) -> Self {
    Self { values }
  }

  /// Configuration holding only the bundled defaults.
  pub fn with_defaults() -> Result<Self, ConfigError> {
    let mut config = Config::new();
    config.merge_yaml(DEFAULTS_YAML, "bundled defaults")?;
    Ok(config)
  }

  /// Load defaults, an optional user file and overrides, then expand references.
  pub fn load(path: Option<&Path>, overrides: &[String]) -> Result<Self, ConfigError> {
    let mut config = Config::with_defaults()?;

    if let Some(path) = path {
      let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
      })?;
      config.merge_yaml(&text, &path.display().to_string())?;
    }

    for item in overrides {
      config.apply_override(item)?;
    }

    config.expand_all()?;
    Ok(config)
  }

  /// Merge a YAML mapping over the current values.
  pub fn merge_yaml(&mut self, text: &str, origin: &str) -> Result<(), ConfigError> {
    let parsed: Value = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
      origin: origin.to_string(),
      source,
    })?;

    match parsed {
      Value::Object(map) => {
        debug!(origin, keys = map.len(), "merging configuration layer");
        self.values.extend(map);
        Ok(())
      }
      // An empty document parses as null.
      Value::Null => Ok(()),
      _ => Err(ConfigError::NotMapping {
        origin: origin.to_string(),
      }),
    }
  }

  /// Apply a `key=value` override. The value is parsed as a YAML scalar, so
  /// `disk=40` sets an integer and `flag=true` a boolean.
  pub fn apply_override(&mut self, item: &str) -> Result<(), ConfigError> {
    let (key, raw) = item
      .split_once('=')
      .filter(|(k, _)| !k.trim().is_empty())
      .ok_or_else(|| ConfigError::InvalidOverride(item.to_string()))?;

    let value = serde_yaml::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    self.values.insert(key.trim().to_string(), value);
    Ok(())
  }

  /// Expand parameter references in every value.
  pub fn expand_all(&mut self) -> Result<(), ConfigError> {
    let lookup: &dyn Lookup = &*self;
    let mut expanded = Map::new();
    for (key, value) in &self.values {
      let value = params::expand_value(value, lookup).map_err(|source| ConfigError::Expand {
        key: key.clone(),
        source,
      })?;
      expanded.insert(key.clone(), value);
    }
    self.values = expanded;
    Ok(())
  }

  /// Expand references in a value against this configuration.
  pub fn expand(&self, value: &Value) -> Result<Value, ParamError> {
    params::expand_value(value, self)
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key).filter(|v| !v.is_null())
  }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.get(key).and_then(Value::as_str)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  /// True when the key holds a truthy value.
  pub fn is_set(&self, key: &str) -> bool {
    self.get(key).is_some_and(is_truthy)
  }

  pub fn set(&mut self, key: &str, value: impl Into<Value>) {
    self.values.insert(key.to_string(), value.into());
  }
}

impl Lookup for Config {
  fn lookup_key(&self, name: &str) -> Option<String> {
    self.get(name).and_then(params::to_param_text)
  }
}
