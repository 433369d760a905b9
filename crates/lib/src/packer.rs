//! Packer driver: assemble, write `packer.json`, then validate and build.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::assemble::{Assembler, AssemblyResult, Target, resolve_targets};
use crate::config::Config;
use crate::error::{Result, SynthError, ValidationError};
use crate::json::to_pretty_string;
use crate::process::{CommandLine, ProcessRunner};
use crate::workdir::WorkDir;

pub const PACKER_CONFIG_FILE_NAME: &str = "packer.json";

const PACKER_COMMAND: &str = "packer_command";
const TEMP_DIR: &str = "temp_dir";

/// Options for a build invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
  /// Targets requested on the command line. Empty falls back to the
  /// configuration's `targets` key.
  pub targets: Vec<Target>,
  /// Validate the generated configuration but skip `packer build`.
  pub dry_run: bool,
  /// Also write the generated configuration here.
  pub dump_path: Option<PathBuf>,
}

/// Run a full build.
///
/// The work directory is acquired before assembly and removed when this
/// returns, on success and on every error path.
pub fn build(config: Config, options: &BuildOptions, runner: &dyn ProcessRunner) -> Result<AssemblyResult> {
  let targets = resolve_targets(&options.targets, &config)?;
  let packer = packer_command(&config)?;

  let work_dir = WorkDir::acquire(config.get_str(TEMP_DIR).map(Path::new))?;
  info!(work_dir = %work_dir.path().display(), ?targets, "starting build");

  let result = Assembler::new(config, work_dir.path(), runner).assemble(&targets)?;

  if let Some(dump_path) = &options.dump_path {
    write_packer_config(&result, dump_path)?;
    info!(path = %dump_path.display(), "dumped packer config");
  }

  let config_path = work_dir.join(PACKER_CONFIG_FILE_NAME);
  write_packer_config(&result, &config_path)?;

  let validate = CommandLine::new(&packer).arg("validate").arg(config_path.display().to_string());
  runner
    .run(&validate, Some(work_dir.path()))
    .map_err(|e| SynthError::external("failed to validate packer config", e))?;

  if options.dry_run {
    info!("dry run, skipping packer build");
    return Ok(result);
  }

  let build = CommandLine::new(&packer).arg("build").arg(config_path.display().to_string());
  runner
    .run(&build, Some(work_dir.path()))
    .map_err(|e| SynthError::external("failed to build packer config", e))?;

  info!("build complete");
  Ok(result)
}

/// Assemble the configuration without invoking Packer.
///
/// Extraction stages still run, so a work directory is used all the same.
pub fn render(config: Config, targets: &[Target], runner: &dyn ProcessRunner) -> Result<AssemblyResult> {
  let targets = resolve_targets(targets, &config)?;
  let work_dir = WorkDir::acquire(config.get_str(TEMP_DIR).map(Path::new))?;
  Assembler::new(config, work_dir.path(), runner).assemble(&targets)
}

/// Write `result` as 4-space indented JSON.
pub fn write_packer_config(result: &AssemblyResult, path: &Path) -> Result<()> {
  let mut text = to_pretty_string(result)?;
  text.push('\n');
  fs::write(path, text).map_err(|e| SynthError::io(path, e))
}

fn packer_command(config: &Config) -> Result<String> {
  config
    .get_str(PACKER_COMMAND)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .ok_or_else(|| ValidationError::Missing(PACKER_COMMAND.to_string()).into())
}
