//! Amazon EBS builder.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use super::{Assembler, Target, path_value};
use crate::error::Result;
use crate::extract;
use crate::mapper::{FieldMapping, map_fields};
use crate::value::ValueKind;

const BOX_NAME: &str = "aws_vagrant_box_name";
const BOX_VERSION: &str = "aws_vagrant_box_version";
const BOX_FILE: &str = "aws_vagrant_box_file";
const AMI_ID: &str = "aws_ami_id";

const AWS_FIELDS: &[FieldMapping] = &[
  FieldMapping::string("aws_access_key", "access_key"),
  FieldMapping::string("aws_secret_key", "secret_key"),
  FieldMapping::string(AMI_ID, "source_ami"),
  FieldMapping::string("aws_region", "region"),
  FieldMapping::string("aws_ami_name", "ami_name"),
  FieldMapping::new("aws_ami_force_deregister", "force_deregister", ValueKind::Bool),
  FieldMapping::string("aws_instance_type", "instance_type"),
  FieldMapping::string("aws_user", "ssh_username"),
  FieldMapping::string("aws_keypair_name", "ssh_keypair_name"),
  FieldMapping::string("aws_private_key_file", "ssh_private_key_file"),
  FieldMapping::new("aws_disk_gb", "volume_size", ValueKind::Int),
  FieldMapping::string("aws_disk_type", "volume_type"),
  FieldMapping::new("aws_ami_tags", "tags", ValueKind::Map),
  FieldMapping::new("aws_ami_builder_tags", "run_tags", ValueKind::Map),
  FieldMapping::string("aws_iam_instance_profile", "iam_instance_profile"),
];

impl Assembler<'_> {
  pub(super) fn build_aws(&mut self) -> Result<Option<Map<String, Value>>> {
    info!("building AWS configuration");

    if let (Some(name), Some(version)) = (self.text_value(BOX_NAME), self.text_value(BOX_VERSION)) {
      let dir = self.target_dir(Target::Aws)?;
      let box_file = extract::repackage_box(self.runner, &name, "aws", &version, &dir)?;
      self.config.set(BOX_FILE, path_value(&box_file));
    }

    if let Some(box_file) = self.string_value(BOX_FILE)? {
      let dir = self.target_dir(Target::Aws)?;
      let ami_id = extract::unpack_ami_id(Path::new(&box_file), &dir)?;
      self.config.set(AMI_ID, ami_id);
    }

    if !self.config.is_set(AMI_ID) {
      info!("no source AMI available, skipping AWS builder");
      return Ok(None);
    }

    let mut builder = Map::new();
    builder.insert("type".to_string(), Value::String("amazon-ebs".to_string()));
    map_fields(&self.config, &mut builder, AWS_FIELDS)?;
    Ok(Some(builder))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::error::SynthError;
  use crate::testutil::{FakeRunner, write_box};
  use serde_json::json;
  use tempfile::TempDir;

  const AWS_BOX: &[(&str, &str)] = &[
    ("metadata.json", r#"{"provider": "aws"}"#),
    ("Vagrantfile", "config.vm.provider :aws do |aws|\n  aws.ami = \"x\"\n  aws.region_config \"us-east-1\", ami: \"ami-from-box\"\nend\n"),
  ];

  fn config(value: Value) -> Config {
    let Value::Object(map) = value else { unreachable!() };
    let mut config = Config::with_defaults().unwrap();
    for (k, v) in map {
      config.set(&k, v);
    }
    config.expand_all().unwrap();
    config
  }

  fn assemble(config: Config, runner: &FakeRunner, work: &TempDir) -> Result<(Option<Value>, Config)> {
    let mut assembler = Assembler::new(config, work.path(), runner);
    let builder = assembler.build_aws()?.map(Value::Object);
    Ok((builder, assembler.config().clone()))
  }

  #[test]
  fn ami_id_alone_builds_with_defaults() {
    let work = TempDir::new().unwrap();
    let (builder, _) = assemble(config(json!({"aws_ami_id": "ami-42"})), &FakeRunner::default(), &work).unwrap();

    assert_eq!(
      builder.unwrap(),
      json!({
        "type": "amazon-ebs",
        "source_ami": "ami-42",
        "region": "us-east-1",
        "force_deregister": false,
        "instance_type": "t2.micro",
        "ssh_username": "ubuntu",
        "volume_type": "gp2",
      })
    );
  }

  #[test]
  fn maps_typed_fields() {
    let work = TempDir::new().unwrap();
    let config = config(json!({
      "aws_ami_id": "ami-42",
      "aws_ami_name": "base-{{ timestamp }}",
      "aws_disk_gb": 30,
      "aws_ami_force_deregister": true,
      "aws_ami_tags": {"team": "infra"},
      "aws_ami_builder_tags": {"Name": "packer"},
      "aws_iam_instance_profile": "builder",
    }));

    let builder = assemble(config, &FakeRunner::default(), &work).unwrap().0.unwrap();

    assert_eq!(builder["ami_name"], json!("base-{{ timestamp }}"));
    assert_eq!(builder["volume_size"], json!(30));
    assert_eq!(builder["force_deregister"], json!(true));
    assert_eq!(builder["tags"], json!({"team": "infra"}));
    assert_eq!(builder["run_tags"], json!({"Name": "packer"}));
    assert_eq!(builder["iam_instance_profile"], json!("builder"));
  }

  #[test]
  fn no_source_ami_emits_nothing() {
    let work = TempDir::new().unwrap();
    let (builder, _) = assemble(config(json!({})), &FakeRunner::default(), &work).unwrap();
    assert!(builder.is_none());
  }

  #[test]
  fn box_file_overrides_ami_id() {
    let work = TempDir::new().unwrap();
    let source = TempDir::new().unwrap();
    let box_file = source.path().join("aws.box");
    write_box(&box_file, AWS_BOX);

    let config = config(json!({
      "aws_ami_id": "ami-stale",
      "aws_vagrant_box_file": box_file.display().to_string(),
    }));

    let (builder, config) = assemble(config, &FakeRunner::default(), &work).unwrap();

    assert_eq!(builder.unwrap()["source_ami"], json!("ami-from-box"));
    assert_eq!(config.get_str(AMI_ID), Some("ami-from-box"));
    assert!(work.path().join("aws").join("Vagrantfile").exists());
  }

  #[test]
  fn installed_box_is_repackaged_with_aws_provider() {
    let work = TempDir::new().unwrap();
    let runner = FakeRunner::repackaging(AWS_BOX);
    let config = config(json!({
      "aws_vagrant_box_name": "org/base",
      "aws_vagrant_box_version": "0.3.1",
    }));

    let (builder, _) = assemble(config, &runner, &work).unwrap();

    assert_eq!(runner.commands(), vec!["vagrant box repackage org/base aws 0.3.1".to_string()]);
    assert_eq!(builder.unwrap()["source_ami"], json!("ami-from-box"));
  }

  #[test]
  fn box_without_ami_line_is_fatal() {
    let work = TempDir::new().unwrap();
    let source = TempDir::new().unwrap();
    let box_file = source.path().join("aws.box");
    write_box(&box_file, &[("Vagrantfile", "Vagrant.configure(\"2\") do |c| end\n")]);

    let config = config(json!({
      "aws_ami_id": "ami-fallback",
      "aws_vagrant_box_file": box_file.display().to_string(),
    }));

    let err = assemble(config, &FakeRunner::default(), &work).unwrap_err();
    assert!(matches!(err, SynthError::Extraction { .. }));
  }

  #[test]
  fn mistyped_tags_fail() {
    let work = TempDir::new().unwrap();
    let config = config(json!({"aws_ami_id": "ami-42", "aws_ami_tags": ["infra"]}));

    let err = assemble(config, &FakeRunner::default(), &work).unwrap_err();
    assert!(matches!(err, SynthError::SchemaType { ref key, .. } if key == "aws_ami_tags"));
  }
}
