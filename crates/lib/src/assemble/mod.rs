//! Assembly of the Packer configuration.
//!
//! The [`Assembler`] owns the working [`Config`] for one pass. Each requested
//! target runs its own decision procedure, which may run extraction stages
//! that write derived keys back into the configuration before the builder
//! entry is mapped. Provisioners and post-processors are added after the
//! targets.
//!
//! Targets are always processed in the order [`Target::ALL`] lists them, so
//! the builder sequence does not depend on how targets were requested.

mod aws;
mod virtualbox;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::config::Config;
use crate::error::{Result, SynthError};
use crate::mapper::{FieldMapping, map_fields};
use crate::process::ProcessRunner;
use crate::provisioner;
use crate::value::{ValueKind, type_name};

/// A platform an image can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
  Virtualbox,
  Aws,
}

impl Target {
  pub const ALL: [Target; 2] = [Target::Virtualbox, Target::Aws];

  pub fn as_str(self) -> &'static str {
    match self {
      Target::Virtualbox => "virtualbox",
      Target::Aws => "aws",
    }
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Target {
  type Err = SynthError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "virtualbox" => Ok(Target::Virtualbox),
      "aws" => Ok(Target::Aws),
      other => Err(SynthError::UnknownTarget(other.to_string())),
    }
  }
}

/// Pick the targets to build: those given explicitly, else the configuration's
/// `targets` list.
pub fn resolve_targets(requested: &[Target], config: &Config) -> Result<Vec<Target>> {
  if !requested.is_empty() {
    return Ok(requested.to_vec());
  }

  let targets = match config.get("targets") {
    None => Vec::new(),
    Some(Value::Array(items)) => items
      .iter()
      .map(|item| match item {
        Value::String(s) => s.parse(),
        other => Err(SynthError::UnknownTarget(other.to_string())),
      })
      .collect::<Result<Vec<_>>>()?,
    Some(other) => {
      return Err(SynthError::SchemaType {
        key: "targets".to_string(),
        expected: ValueKind::List,
        actual: type_name(other).to_string(),
      });
    }
  };

  if targets.is_empty() {
    return Err(SynthError::NoTargets);
  }
  Ok(targets)
}

/// The complete Packer configuration produced by one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyResult {
  pub builders: Vec<Value>,
  pub provisioners: Vec<Value>,
  #[serde(rename = "post-processors")]
  pub post_processors: Vec<Value>,
}

const VAGRANT_OUTPUT_FIELDS: &[FieldMapping] = &[FieldMapping::string("vagrant_output", "output")];

/// Runs the per-target decision procedures against one working configuration.
pub struct Assembler<'a> {
  config: Config,
  work_dir: &'a Path,
  runner: &'a dyn ProcessRunner,
}

impl<'a> Assembler<'a> {
  pub fn new(config: Config, work_dir: &'a Path, runner: &'a dyn ProcessRunner) -> Self {
    Self {
      config,
      work_dir,
      runner,
    }
  }

  /// The working configuration, including keys written by extraction stages.
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Build the full Packer configuration for `targets`.
  pub fn assemble(&mut self, targets: &[Target]) -> Result<AssemblyResult> {
    let mut result = AssemblyResult::default();

    for target in Target::ALL.into_iter().filter(|t| targets.contains(t)) {
      let builder = match target {
        Target::Virtualbox => self.build_virtualbox()?,
        Target::Aws => self.build_aws()?,
      };
      match builder {
        Some(builder) => result.builders.push(Value::Object(builder)),
        None => info!(%target, "no builder emitted"),
      }
    }

    result.provisioners = provisioner::synthesize(&self.config)?;
    result.post_processors = self.post_processors()?;

    info!(
      builders = result.builders.len(),
      provisioners = result.provisioners.len(),
      post_processors = result.post_processors.len(),
      "assembled packer config"
    );
    Ok(result)
  }

  fn post_processors(&self) -> Result<Vec<Value>> {
    if !self.config.is_set("vagrant") {
      return Ok(Vec::new());
    }

    let mut vagrant = Map::new();
    vagrant.insert("type".to_string(), Value::String("vagrant".to_string()));

    if self.config.is_set("vagrant_output") {
      map_fields(&self.config, &mut vagrant, VAGRANT_OUTPUT_FIELDS)?;
    }
    if self.config.is_set("vagrant_keep_inputs") {
      vagrant.insert("keep_input_artifact".to_string(), Value::Bool(true));
    }

    Ok(vec![Value::Object(vagrant)])
  }

  /// Per-target scratch directory inside the work directory.
  fn target_dir(&self, target: Target) -> Result<PathBuf> {
    let dir = self.work_dir.join(target.as_str());
    fs::create_dir_all(&dir).map_err(|e| SynthError::io(&dir, e))?;
    Ok(dir)
  }

  /// A configured string value, if set. Present but non-string values fail.
  fn string_value(&self, key: &str) -> Result<Option<String>> {
    match self.config.get(key) {
      None => Ok(None),
      Some(Value::String(s)) if s.is_empty() => Ok(None),
      Some(Value::String(s)) => Ok(Some(s.clone())),
      Some(other) => Err(SynthError::SchemaType {
        key: key.to_string(),
        expected: ValueKind::String,
        actual: type_name(other).to_string(),
      }),
    }
  }

  /// A configured scalar rendered as text, e.g. a box version written as `1.0`.
  fn text_value(&self, key: &str) -> Option<String> {
    self
      .config
      .get(key)
      .filter(|v| crate::value::is_truthy(v))
      .and_then(crate::params::to_param_text)
  }
}

/// Text for a path recorded back into the configuration.
fn path_value(path: &Path) -> Value {
  Value::String(path.display().to_string())
}
