//! Field schemas for the supported provisioner types.

use serde_json::{Map, Value};

use crate::value::ValueKind;

/// Rewrites a validated value before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
  /// Expand parameter references, then encode as single-line JSON text.
  ExpandedJson,
}

/// One field a provisioner declaration may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
  pub name: &'static str,
  pub kind: ValueKind,
  pub required: bool,
  /// Default used when the declaration omits the field. May contain
  /// `(( name ))` references.
  pub default: Option<&'static str>,
  pub transform: Option<Transform>,
}

impl FieldDef {
  /// A required string field.
  pub const fn required(name: &'static str) -> Self {
    Self {
      name,
      kind: ValueKind::String,
      required: true,
      default: None,
      transform: None,
    }
  }

  pub const fn optional(name: &'static str, kind: ValueKind) -> Self {
    Self {
      name,
      kind,
      required: false,
      default: None,
      transform: None,
    }
  }

  pub const fn with_default(mut self, default: &'static str) -> Self {
    self.default = Some(default);
    self
  }

  pub const fn with_transform(mut self, transform: Transform) -> Self {
    self.transform = Some(transform);
    self
  }
}

const FILE_FIELDS: &[FieldDef] = &[
  FieldDef::required("source"),
  FieldDef::required("destination"),
  FieldDef::optional("direction", ValueKind::String),
];

const SHELL_FIELDS: &[FieldDef] = &[
  FieldDef::optional("inline", ValueKind::List),
  FieldDef::optional("script", ValueKind::String),
  FieldDef::optional("scripts", ValueKind::List),
  FieldDef::optional("execute_command", ValueKind::String).with_default("(( shell_command ))"),
  FieldDef::optional("environment_vars", ValueKind::List),
];

const ANSIBLE_LOCAL_FIELDS: &[FieldDef] = &[
  FieldDef::required("playbook_file"),
  FieldDef::optional("playbook_dir", ValueKind::String),
  FieldDef::optional("command", ValueKind::String),
  FieldDef::optional("extra_arguments", ValueKind::List),
  FieldDef::optional("extra_vars", ValueKind::Map).with_transform(Transform::ExpandedJson),
];

/// The provisioner types Packer is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionerKind {
  File,
  Shell,
  AnsibleLocal,
}

impl ProvisionerKind {
  pub fn from_type(name: &str) -> Option<Self> {
    match name {
      "file" => Some(ProvisionerKind::File),
      "shell" => Some(ProvisionerKind::Shell),
      "ansible-local" => Some(ProvisionerKind::AnsibleLocal),
      _ => None,
    }
  }

  pub fn type_name(self) -> &'static str {
    match self {
      ProvisionerKind::File => "file",
      ProvisionerKind::Shell => "shell",
      ProvisionerKind::AnsibleLocal => "ansible-local",
    }
  }

  pub fn fields(self) -> &'static [FieldDef] {
    match self {
      ProvisionerKind::File => FILE_FIELDS,
      ProvisionerKind::Shell => SHELL_FIELDS,
      ProvisionerKind::AnsibleLocal => ANSIBLE_LOCAL_FIELDS,
    }
  }

  /// Restructure validated output. Runs once, after validation succeeds.
  pub fn post_process(self, output: &mut Map<String, Value>) {
    match self {
      ProvisionerKind::AnsibleLocal => fold_extra_vars(output),
      ProvisionerKind::File | ProvisionerKind::Shell => {}
    }
  }
}

/// Move encoded `extra_vars` into an `-e '<json>'` entry of `extra_arguments`.
fn fold_extra_vars(output: &mut Map<String, Value>) {
  let Some(Value::String(encoded)) = output.remove("extra_vars") else {
    return;
  };
  if encoded.is_empty() {
    return;
  }

  let entry = Value::String(format!("-e '{}'", encoded));
  match output.get_mut("extra_arguments") {
    Some(Value::Array(args)) => args.push(entry),
    _ => {
      output.insert("extra_arguments".to_string(), Value::Array(vec![entry]));
    }
  }
}
