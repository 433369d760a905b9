//! Shared test helpers for CLI integration tests.

use std::fs::File;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Commands run with the temporary directory as their working directory, so
/// `packermate.yml` discovery and `--dump` output stay inside it. Work
/// directories are created under `scratch`.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  /// Create from a fixture file, copied to `packermate.yml`.
  pub fn from_fixture(name: &str) -> Self {
    let env = Self::empty();
    std::fs::write(&env.config_path, fixture_content(name)).unwrap();
    env
  }

  /// Create an environment without a configuration file.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("scratch")).unwrap();
    let config_path = temp.path().join("packermate.yml");
    Self { temp, config_path }
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn scratch_dir(&self) -> PathBuf {
    self.temp.path().join("scratch")
  }

  /// A packermate command running inside this environment.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("packermate");
    cmd.current_dir(self.path());
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// A command with `temp_dir` pointed at the scratch directory.
  pub fn cmd_with(&self, subcommand: &str) -> Command {
    let mut cmd = self.cmd();
    cmd
      .arg(subcommand)
      .arg("--set")
      .arg(format!("temp_dir={}", self.scratch_dir().display()));
    cmd
  }

  /// Write a gzip-compressed box archive and return its path.
  pub fn write_box(&self, name: &str, members: &[(&str, &str)]) -> PathBuf {
    let path = self.path().join(name);
    let file = File::create(&path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (member, content) in members {
      let mut header = tar::Header::new_gnu();
      header.set_size(content.len() as u64);
      header.set_mode(0o644);
      builder.append_data(&mut header, member, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
    path
  }

  /// True when no work directory was left behind.
  pub fn scratch_is_empty(&self) -> bool {
    std::fs::read_dir(self.scratch_dir()).unwrap().next().is_none()
  }
}

/// Parse stdout of a successful `render` run.
pub fn rendered(output: &[u8]) -> serde_json::Value {
  serde_json::from_slice(output).unwrap_or_else(|e| panic!("render output is not JSON: {}", e))
}
