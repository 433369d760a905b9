mod build;
mod render;

pub use build::cmd_build;
pub use render::cmd_render;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use packermate_lib::Config;

/// Configuration file used when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "packermate.yml";

/// Load the layered configuration.
///
/// An explicit path must exist. Without one, `packermate.yml` in the current
/// directory is used if present, otherwise only defaults and overrides apply.
fn load_config(path: Option<&Path>, overrides: &[String]) -> Result<Config> {
  let default = Path::new(DEFAULT_CONFIG_FILE);
  let path = path.or_else(|| default.is_file().then_some(default));

  match path {
    Some(path) => debug!(path = %path.display(), "loading configuration"),
    None => debug!("no configuration file, using defaults"),
  }

  Config::load(path, overrides).context("Failed to load configuration")
}
