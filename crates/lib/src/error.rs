//! Error types for configuration synthesis.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::params::ParamError;
use crate::process::ProcessError;
use crate::value::ValueKind;

/// Errors that abort a synthesis pass.
///
/// Every variant is terminal: no partial assembly result is produced.
#[derive(Debug, Error)]
pub enum SynthError {
  /// A configuration key is present with the wrong type.
  #[error("parameter type mismatch: name='{key}' expected='{expected}' received='{actual}'")]
  SchemaType {
    key: String,
    expected: ValueKind,
    actual: String,
  },

  /// A declared value is missing, mistyped, or not recognised by its schema.
  #[error(transparent)]
  SchemaValidation(#[from] ValidationError),

  /// A provisioner declaration names a type with no schema.
  #[error("unknown provisioner type: type='{0}'")]
  UnknownProvisionerType(String),

  /// Metadata could not be derived from a packaged artifact.
  #[error("extraction failed: {message}")]
  Extraction { message: String },

  /// An external tool exited unsuccessfully.
  #[error("{context}: {source}")]
  ExternalTool {
    context: String,
    #[source]
    source: ProcessError,
  },

  #[error("unknown target: '{0}' (expected virtualbox or aws)")]
  UnknownTarget(String),

  #[error("no targets requested and none configured")]
  NoTargets,

  #[error("parameter expansion failed: {0}")]
  Parameter(#[from] ParamError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("io error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize packer config: {0}")]
  Json(#[from] serde_json::Error),
}

/// Schema validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  /// A field is required but absent, or present with the wrong type. `actual`
  /// is empty when the value is absent.
  #[error("invalid provisioner value: name='{name}' type='{actual}' type_expected='{expected}'")]
  InvalidValue {
    name: String,
    actual: String,
    expected: ValueKind,
  },

  /// A declaration carries keys its schema does not know.
  #[error("invalid provisioner value: type='{provisioner}' unrecognized name='{}'", .keys.join(","))]
  Unrecognized { provisioner: String, keys: Vec<String> },

  #[error("provisioners must be a list, got {0}")]
  ProvisionersNotList(String),

  #[error("provisioner declaration must be a mapping, got {0}")]
  DeclarationNotMapping(String),

  /// A builder needs a value that no configuration layer provides.
  #[error("missing required value '{0}'")]
  Missing(String),
}

impl SynthError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    SynthError::Io {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn external(context: impl Into<String>, source: ProcessError) -> Self {
    SynthError::ExternalTool {
      context: context.into(),
      source,
    }
  }
}

pub type Result<T, E = SynthError> = std::result::Result<T, E>;
