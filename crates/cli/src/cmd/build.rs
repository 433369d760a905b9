//! Implementation of the `packermate build` command.
//!
//! Assembles the Packer configuration, validates it with `packer validate`
//! and, unless `--dry-run` is given, runs `packer build`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use packermate_lib::packer::{self, BuildOptions, PACKER_CONFIG_FILE_NAME};
use packermate_lib::{SystemRunner, Target};

use crate::output::{print_info, print_success};

pub fn cmd_build(config_path: Option<&Path>, overrides: &[String], targets: &[Target], dry_run: bool, dump: bool) -> Result<()> {
  let config = super::load_config(config_path, overrides)?;

  let options = BuildOptions {
    targets: targets.to_vec(),
    dry_run,
    dump_path: dump.then(|| PathBuf::from(PACKER_CONFIG_FILE_NAME)),
  };

  let result = packer::build(config, &options, &SystemRunner).context("Build failed")?;

  if let Some(path) = &options.dump_path {
    print_info(&format!("Wrote {}", path.display()));
  }

  let builders = result.builders.len();
  if dry_run {
    print_success(&format!("Configuration valid ({} builder(s), dry run)", builders));
  } else {
    print_success(&format!("Build complete ({} builder(s))", builders));
  }

  Ok(())
}
