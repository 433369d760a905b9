//! Build command integration tests.
//!
//! `packer_command` is pointed at `true`/`false` so no real Packer is needed.

use predicates::prelude::*;

use super::common::{TestEnv, rendered};

#[test]
#[cfg(unix)]
fn dry_run_validates_only() {
  let env = TestEnv::from_fixture("ovf.yml");

  env
    .cmd_with("build")
    .arg("--dry-run")
    .arg("--set")
    .arg("packer_command=true")
    .assert()
    .success()
    .stdout(predicate::str::contains("dry run"));

  assert!(env.scratch_is_empty());
}

#[test]
#[cfg(unix)]
fn build_runs_packer() {
  let env = TestEnv::from_fixture("aws.yml");

  env
    .cmd_with("build")
    .arg("--set")
    .arg("packer_command=true")
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete (1 builder(s))"));
}

#[test]
#[cfg(unix)]
fn dump_writes_packer_json() {
  let env = TestEnv::from_fixture("ovf.yml");

  env
    .cmd_with("build")
    .arg("--dry-run")
    .arg("--dump")
    .arg("--set")
    .arg("packer_command=true")
    .assert()
    .success();

  let dumped = std::fs::read(env.path().join("packer.json")).unwrap();
  assert_eq!(rendered(&dumped)["builders"][0]["type"], "virtualbox-ovf");
}

#[test]
#[cfg(unix)]
fn validate_failure_is_reported() {
  let env = TestEnv::from_fixture("ovf.yml");

  env
    .cmd_with("build")
    .arg("--set")
    .arg("packer_command=false")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to validate packer config"));

  assert!(env.scratch_is_empty());
}

#[test]
fn missing_packer_binary_is_reported() {
  let env = TestEnv::from_fixture("ovf.yml");

  env
    .cmd_with("build")
    .arg("--set")
    .arg("packer_command=packermate-no-such-packer")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to spawn 'packermate-no-such-packer'"));
}
