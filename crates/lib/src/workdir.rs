//! Scoped working directory for one synthesis pass.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::{Result, SynthError};

const PREFIX: &str = "packermate-";

/// A temporary directory that is removed recursively when dropped.
///
/// Extracted box contents, the rendered boot configuration and the generated
/// `packer.json` all live here for the duration of a build.
#[derive(Debug)]
pub struct WorkDir {
  dir: TempDir,
}

impl WorkDir {
  /// Create a fresh directory under `root`, or the system temp directory.
  pub fn acquire(root: Option<&Path>) -> Result<Self> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(PREFIX);

    let dir = match root {
      Some(root) => builder.tempdir_in(root).map_err(|e| SynthError::io(root, e))?,
      None => builder.tempdir().map_err(|e| SynthError::io(std::env::temp_dir(), e))?,
    };

    debug!(path = %dir.path().display(), "acquired work directory");
    Ok(Self { dir })
  }

  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
    self.dir.path().join(name)
  }
}
