//! Implementation of the `packermate render` command.

use std::path::Path;

use anyhow::{Context, Result};

use packermate_lib::{SystemRunner, Target, packer};

use crate::output::print_json;

/// Print the assembled configuration to stdout.
///
/// Box extraction still runs, but Packer is never invoked.
pub fn cmd_render(config_path: Option<&Path>, overrides: &[String], targets: &[Target]) -> Result<()> {
  let config = super::load_config(config_path, overrides)?;
  let result = packer::render(config, targets, &SystemRunner).context("Failed to assemble configuration")?;
  print_json(&result)
}
