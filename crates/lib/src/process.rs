//! External process execution.
//!
//! External tools (`vagrant`, `packer`) are run through the [`ProcessRunner`]
//! trait so the assembly pipeline can be exercised without them. Commands are
//! executed directly, not through a shell, and block until the tool exits.

use std::fmt;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The program could not be started.
  #[error("failed to spawn '{program}': {source}")]
  Spawn { program: String, source: std::io::Error },

  /// The program exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed { cmd: String, code: Option<i32> },
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
  pub program: String,
  pub args: Vec<String>,
}

impl CommandLine {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }
}

impl fmt::Display for CommandLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Runs external commands to completion.
pub trait ProcessRunner {
  /// Run a command, optionally in `working_dir`, returning once it exits.
  fn run(&self, command: &CommandLine, working_dir: Option<&Path>) -> Result<(), ProcessError>;
}

/// Runs commands as child processes of this one.
///
/// Standard output and error are inherited so long-running tools such as
/// `packer build` report progress directly to the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
  fn run(&self, command: &CommandLine, working_dir: Option<&Path>) -> Result<(), ProcessError> {
    info!(cmd = %command, "executing command");

    let mut child = Command::new(&command.program);
    child.args(&command.args);
    if let Some(dir) = working_dir {
      debug!(working_dir = %dir.display(), "setting working directory");
      child.current_dir(dir);
    }

    let status = child.status().map_err(|source| ProcessError::Spawn {
      program: command.program.clone(),
      source,
    })?;

    if !status.success() {
      return Err(ProcessError::Failed {
        cmd: command.to_string(),
        code: status.code(),
      });
    }

    Ok(())
  }
}
