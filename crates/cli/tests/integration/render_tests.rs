//! Render command integration tests.

use predicates::prelude::*;
use serde_json::json;

use super::common::{TestEnv, rendered};

#[test]
fn render_ovf_config() {
  let env = TestEnv::from_fixture("ovf.yml");

  let output = env.cmd_with("render").assert().success().get_output().stdout.clone();
  let config = rendered(&output);

  assert_eq!(config["builders"].as_array().unwrap().len(), 1);
  let builder = &config["builders"][0];
  assert_eq!(builder["type"], json!("virtualbox-ovf"));
  assert_eq!(builder["source_path"], json!("/boxes/base.ovf"));
  assert_eq!(builder["vm_name"], json!("base-provisioned"));

  assert_eq!(config["provisioners"][0]["type"], json!("shell"));
  assert_eq!(
    config["provisioners"][0]["execute_command"],
    json!("{{ .Vars }} sudo -E -S sh '{{ .Path }}'")
  );
  assert_eq!(config["post-processors"], json!([]));
  assert!(env.scratch_is_empty());
}

#[test]
fn render_output_uses_four_space_indent() {
  let env = TestEnv::from_fixture("ovf.yml");

  env
    .cmd_with("render")
    .assert()
    .success()
    .stdout(predicate::str::starts_with("{\n    \"builders\": ["));
}

#[test]
fn render_aws_config_expands_parameters() {
  let env = TestEnv::from_fixture("aws.yml");

  let output = env.cmd_with("render").assert().success().get_output().stdout.clone();
  let config = rendered(&output);

  let builder = &config["builders"][0];
  assert_eq!(builder["type"], json!("amazon-ebs"));
  assert_eq!(builder["source_ami"], json!("ami-0abc1234"));
  assert_eq!(builder["region"], json!("eu-west-1"));
  assert_eq!(builder["ami_name"], json!("packermate-{{ timestamp }}"));
  assert_eq!(builder["volume_size"], json!(20));
  assert_eq!(builder["tags"], json!({"project": "packermate"}));

  let ansible = &config["provisioners"][0];
  assert_eq!(ansible["type"], json!("ansible-local"));
  assert_eq!(ansible["extra_arguments"], json!(["-e '{\"project\": \"packermate\"}'"]));
  assert!(ansible.get("extra_vars").is_none());

  assert_eq!(
    config["post-processors"],
    json!([{"type": "vagrant", "output": "packermate-{{ .Provider }}.box"}])
  );
}

#[test]
fn explicit_targets_override_config() {
  let env = TestEnv::from_fixture("ovf.yml");

  let output = env
    .cmd_with("render")
    .arg("aws")
    .arg("--set")
    .arg("aws_ami_id=ami-override")
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let config = rendered(&output);
  assert_eq!(config["builders"].as_array().unwrap().len(), 1);
  assert_eq!(config["builders"][0]["type"], json!("amazon-ebs"));
}

#[test]
fn ami_id_extracted_from_box_file() {
  let env = TestEnv::empty();
  let box_file = env.write_box(
    "aws.box",
    &[
      ("metadata.json", r#"{"provider": "aws"}"#),
      (
        "Vagrantfile",
        "Vagrant.configure(\"2\") do |config|\n  config.vm.provider :aws do |aws|\n    aws.region_config \"us-east-1\", ami: \"ami-from-box\"\n  end\nend\n",
      ),
    ],
  );

  let output = env
    .cmd_with("render")
    .arg("aws")
    .arg("--set")
    .arg(format!("aws_vagrant_box_file={}", box_file.display()))
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  assert_eq!(rendered(&output)["builders"][0]["source_ami"], json!("ami-from-box"));
  assert!(env.scratch_is_empty());
}

#[test]
fn box_without_ami_fails() {
  let env = TestEnv::empty();
  let box_file = env.write_box("aws.box", &[("Vagrantfile", "Vagrant.configure(\"2\") do |c| end\n")]);

  env
    .cmd_with("render")
    .arg("aws")
    .arg("--set")
    .arg(format!("aws_vagrant_box_file={}", box_file.display()))
    .assert()
    .failure()
    .stderr(predicate::str::contains("AMI id"));

  assert!(env.scratch_is_empty());
}

#[test]
fn unknown_provisioner_fails() {
  let env = TestEnv::from_fixture("unknown_provisioner.yml");

  env
    .cmd_with("render")
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("unknown provisioner type: type='puppet-masterless'"));
}

#[test]
fn unrecognized_provisioner_field_fails() {
  let env = TestEnv::from_fixture("unrecognized_field.yml");

  env
    .cmd_with("render")
    .assert()
    .failure()
    .stderr(predicate::str::contains("unrecognized name='mode'"));
}

#[test]
fn mistyped_value_names_the_key() {
  let env = TestEnv::from_fixture("aws.yml");

  env
    .cmd_with("render")
    .arg("--set")
    .arg("aws_disk_gb=large")
    .assert()
    .failure()
    .stderr(predicate::str::contains("name='aws_disk_gb'"));
}

#[test]
fn no_targets_fails() {
  let env = TestEnv::empty();

  env
    .cmd_with("render")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no targets"));
}

#[test]
fn explicit_config_path() {
  let env = TestEnv::empty();

  let output = env
    .cmd_with("render")
    .arg("--config")
    .arg(super::common::fixture_path("ovf.yml"))
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  assert_eq!(rendered(&output)["builders"][0]["type"], json!("virtualbox-ovf"));
}
