//! Test utilities for packermate-lib.
//!
//! A process runner that records commands instead of running them, and
//! builders for small Vagrant box archives.

use std::cell::RefCell;
use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::process::{CommandLine, ProcessError, ProcessRunner};

type DirHook = Box<dyn Fn(&Path)>;

/// Records every command. Commands starting with `fail_prefix` fail, and
/// `on_repackage` stands in for `vagrant box repackage` writing its archive.
#[derive(Default)]
pub struct FakeRunner {
  pub calls: RefCell<Vec<(String, Option<PathBuf>)>>,
  pub on_repackage: Option<DirHook>,
  pub fail_prefix: Option<String>,
}

impl FakeRunner {
  pub fn failing(prefix: &str) -> Self {
    Self {
      fail_prefix: Some(prefix.to_string()),
      ..Default::default()
    }
  }

  /// Runner whose repackage step writes a box with `members` into the working directory.
  pub fn repackaging(members: &'static [(&'static str, &'static str)]) -> Self {
    Self {
      on_repackage: Some(Box::new(move |dir: &Path| write_box(&dir.join("package.box"), members))),
      ..Default::default()
    }
  }

  pub fn commands(&self) -> Vec<String> {
    self.calls.borrow().iter().map(|(cmd, _)| cmd.clone()).collect()
  }
}

impl ProcessRunner for FakeRunner {
  fn run(&self, command: &CommandLine, working_dir: Option<&Path>) -> Result<(), ProcessError> {
    let text = command.to_string();
    self
      .calls
      .borrow_mut()
      .push((text.clone(), working_dir.map(Path::to_path_buf)));

    if self.fail_prefix.as_deref().is_some_and(|p| text.starts_with(p)) {
      return Err(ProcessError::Failed { cmd: text, code: Some(1) });
    }

    if let (true, Some(hook), Some(dir)) = (text.starts_with("vagrant box repackage"), &self.on_repackage, working_dir) {
      hook(dir);
    }
    Ok(())
  }
}

/// Write a gzip-compressed tar at `path` holding `(name, content)` members.
pub fn write_box(path: &Path, members: &[(&str, &str)]) {
  let file = File::create(path).unwrap();
  let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
  append_members(&mut builder, members);
  builder.into_inner().unwrap().finish().unwrap();
}

/// Write an uncompressed tar at `path`.
pub fn write_plain_box(path: &Path, members: &[(&str, &str)]) {
  let mut builder = tar::Builder::new(File::create(path).unwrap());
  append_members(&mut builder, members);
  builder.finish().unwrap();
}

fn append_members<W: std::io::Write>(builder: &mut tar::Builder<W>, members: &[(&str, &str)]) {
  for (name, content) in members {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, name, content.as_bytes()).unwrap();
  }
}
