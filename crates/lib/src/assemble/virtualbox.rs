//! VirtualBox builder: a fresh ISO install, or an import of an existing OVF.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use super::{Assembler, Target, path_value};
use crate::error::{Result, SynthError, ValidationError};
use crate::extract;
use crate::mapper::{FieldMapping, map_fields};
use crate::params::to_param_text;
use crate::templates::{self, BuilderTemplate, PRESEED_FILE_NAME};
use crate::value::ValueKind;

const ISO_URL: &str = "virtualbox_iso_url";
const ISO_CHECKSUM: &str = "virtualbox_iso_checksum";
const BOX_NAME: &str = "virtualbox_vagrant_box_name";
const BOX_VERSION: &str = "virtualbox_vagrant_box_version";
const BOX_FILE: &str = "virtualbox_vagrant_box_file";
const OVF_INPUT_FILE: &str = "virtualbox_ovf_input_file";
const HTTP_DIR: &str = "virtualbox_packer_http_dir";

const ISO_FIELDS: &[FieldMapping] = &[
  FieldMapping::string("virtualbox_ovf_output", "vm_name"),
  FieldMapping::string(ISO_URL, "iso_url"),
  FieldMapping::string(ISO_CHECKSUM, "iso_checksum"),
  FieldMapping::string("virtualbox_iso_checksum_type", "iso_checksum_type"),
  FieldMapping::string("virtualbox_guest_os_type", "guest_os_type"),
  FieldMapping::new("virtualbox_disk_mb", "disk_size", ValueKind::Int),
  FieldMapping::string("virtualbox_user", "ssh_username"),
  FieldMapping::string("virtualbox_password", "ssh_password"),
  FieldMapping::string("virtualbox_shutdown_command", "shutdown_command"),
  FieldMapping::string("virtualbox_output_directory", "output_directory"),
];

const OVF_FIELDS: &[FieldMapping] = &[
  FieldMapping::string("virtualbox_ovf_output", "vm_name"),
  FieldMapping::string("virtualbox_user", "ssh_username"),
  FieldMapping::string("virtualbox_password", "ssh_password"),
  // packer reads the key from ssh_key_path for OVF imports
  FieldMapping::string("virtualbox_private_key_file", "ssh_key_path"),
  FieldMapping::string(OVF_INPUT_FILE, "source_path"),
  FieldMapping::string("virtualbox_output_directory", "output_directory"),
];

/// `vboxmanage modifyvm` flags set from optional configuration keys.
const MODIFYVM_FLAGS: &[(&str, &str)] = &[("virtualbox_memory_mb", "--memory"), ("virtualbox_cpus", "--cpus")];

impl Assembler<'_> {
  pub(super) fn build_virtualbox(&mut self) -> Result<Option<Map<String, Value>>> {
    if self.config.is_set(ISO_URL) && self.config.is_set(ISO_CHECKSUM) {
      info!("building VirtualBox ISO configuration");
      return self.build_virtualbox_iso().map(Some);
    }

    info!("building VirtualBox OVF configuration");

    if let (Some(name), Some(version)) = (self.text_value(BOX_NAME), self.text_value(BOX_VERSION)) {
      let dir = self.target_dir(Target::Virtualbox)?;
      let box_file = extract::repackage_box(self.runner, &name, "virtualbox", &version, &dir)?;
      self.config.set(BOX_FILE, path_value(&box_file));
    }

    if let Some(box_file) = self.string_value(BOX_FILE)? {
      let dir = self.target_dir(Target::Virtualbox)?;
      let ovf = extract::unpack_descriptor(Path::new(&box_file), &dir)?;
      self.config.set(OVF_INPUT_FILE, path_value(&ovf));
    }

    if !self.config.is_set(OVF_INPUT_FILE) {
      info!("no OVF input file available, skipping VirtualBox builder");
      return Ok(None);
    }

    let mut builder = BuilderTemplate::VirtualboxOvf.load()?;
    map_fields(&self.config, &mut builder, OVF_FIELDS)?;
    Ok(Some(builder))
  }

  fn build_virtualbox_iso(&self) -> Result<Map<String, Value>> {
    let mut builder = BuilderTemplate::VirtualboxIso.load()?;
    map_fields(&self.config, &mut builder, ISO_FIELDS)?;

    let modifyvm: Vec<Value> = MODIFYVM_FLAGS
      .iter()
      .filter_map(|&(key, flag)| {
        let value = self.config.get(key).and_then(to_param_text)?;
        Some(Value::from(vec!["modifyvm", "{{ .Name }}", flag, value.as_str()]))
      })
      .collect();

    match builder
      .entry("vboxmanage")
      .or_insert_with(|| Value::Array(Vec::new()))
    {
      Value::Array(entries) => entries.extend(modifyvm),
      other => *other = Value::Array(modifyvm),
    }

    self.write_preseed(&mut builder)?;
    Ok(builder)
  }

  /// Create the HTTP directory Packer serves to the installer and write the
  /// rendered preseed into it.
  fn write_preseed(&self, builder: &mut Map<String, Value>) -> Result<()> {
    let http_dir_name = self
      .string_value(HTTP_DIR)?
      .ok_or_else(|| ValidationError::Missing(HTTP_DIR.to_string()))?;

    let user = required_str(builder, "ssh_username", "virtualbox_user")?;
    let password = required_str(builder, "ssh_password", "virtualbox_password")?;
    let preseed = templates::render_preseed(user, password);

    let http_dir = self.target_dir(Target::Virtualbox)?.join(http_dir_name);
    fs::create_dir_all(&http_dir).map_err(|e| SynthError::io(&http_dir, e))?;

    let preseed_path = http_dir.join(PRESEED_FILE_NAME);
    fs::write(&preseed_path, preseed).map_err(|e| SynthError::io(&preseed_path, e))?;

    builder.insert("http_directory".to_string(), path_value(&http_dir));
    Ok(())
  }
}

fn required_str<'b>(builder: &'b Map<String, Value>, field: &str, source_key: &str) -> Result<&'b str> {
  builder
    .get(field)
    .and_then(Value::as_str)
    .ok_or_else(|| ValidationError::Missing(source_key.to_string()).into())
}
