//! Metadata extraction from packaged Vagrant boxes.
//!
//! A box is a tar archive (usually gzip-compressed) holding the provider's
//! machine image plus a `Vagrantfile`. The virtualization target needs the
//! OVF descriptor inside a VirtualBox box; the cloud target needs the AMI id
//! that an AWS box's `Vagrantfile` points at.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use flate2::read::GzDecoder;
use regex::Regex;
use tar::Archive;
use tracing::{debug, info};

use crate::error::{Result, SynthError};
use crate::process::{CommandLine, ProcessRunner};

/// Name of the archive `vagrant box repackage` writes into its working directory.
pub const REPACKAGED_BOX_FILE_NAME: &str = "package.box";

/// Descriptor file inside a VirtualBox box.
pub const EXTRACTED_OVF_FILE_NAME: &str = "box.ovf";

pub const VAGRANTFILE_NAME: &str = "Vagrantfile";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

static AMI_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"ami:\s*"([^"]+)""#).expect("AMI pattern is a valid regex"));

/// Materialize an installed box as an archive in `work_dir`.
///
/// Runs `vagrant box repackage <name> <provider> <version>` and returns the
/// path of the archive it produces.
pub fn repackage_box(
  runner: &dyn ProcessRunner,
  name: &str,
  provider: &str,
  version: &str,
  work_dir: &Path,
) -> Result<PathBuf> {
  info!(box_name = name, provider, version, "repackaging installed vagrant box");

  let cmd = CommandLine::new("vagrant")
    .arg("box")
    .arg("repackage")
    .arg(name)
    .arg(provider)
    .arg(version);

  runner
    .run(&cmd, Some(work_dir))
    .map_err(|e| SynthError::external(format!("failed to repackage vagrant box '{}'", name), e))?;

  Ok(work_dir.join(REPACKAGED_BOX_FILE_NAME))
}

/// Unpack a whole box into `work_dir` and return the path of its OVF descriptor.
pub fn unpack_descriptor(box_file: &Path, work_dir: &Path) -> Result<PathBuf> {
  info!(box_file = %box_file.display(), "extracting OVF descriptor from vagrant box");

  let mut archive = open_archive(box_file)?;
  archive
    .unpack(work_dir)
    .map_err(|e| extraction(format!("failed to unpack {}: {}", box_file.display(), e)))?;

  let descriptor = work_dir.join(EXTRACTED_OVF_FILE_NAME);
  if !descriptor.is_file() {
    return Err(extraction(format!(
      "no {} found in vagrant box {}",
      EXTRACTED_OVF_FILE_NAME,
      box_file.display()
    )));
  }

  Ok(descriptor)
}

/// Unpack only the box's `Vagrantfile` into `work_dir` and return the AMI id
/// it references.
pub fn unpack_ami_id(box_file: &Path, work_dir: &Path) -> Result<String> {
  info!(box_file = %box_file.display(), "extracting AWS AMI id from vagrant box");

  let vagrantfile = extract_member(box_file, VAGRANTFILE_NAME, work_dir)?;
  let file = File::open(&vagrantfile).map_err(|e| SynthError::io(&vagrantfile, e))?;

  let ami_id = scan_ami_id(BufReader::new(file))
    .map_err(|e| SynthError::io(&vagrantfile, e))?
    .ok_or_else(|| extraction("unable to extract AWS AMI id from vagrant box file"))?;

  debug!(ami_id = %ami_id, "found AMI id");
  Ok(ami_id)
}

/// Return the value of the first `ami: "<id>"` line.
pub fn scan_ami_id(reader: impl BufRead) -> std::io::Result<Option<String>> {
  for line in reader.lines() {
    let line = line?;
    if let Some(captures) = AMI_PATTERN.captures(&line) {
      return Ok(Some(captures[1].to_string()));
    }
  }
  Ok(None)
}

/// Extract the single archive member `name` into `dest_dir`.
fn extract_member(box_file: &Path, name: &str, dest_dir: &Path) -> Result<PathBuf> {
  let mut archive = open_archive(box_file)?;
  let read_err = |e: std::io::Error| extraction(format!("failed to read {}: {}", box_file.display(), e));

  for entry in archive.entries().map_err(read_err)? {
    let mut entry = entry.map_err(read_err)?;
    let path = entry.path().map_err(read_err)?;

    if normalize(&path) == Path::new(name) {
      let dest = dest_dir.join(name);
      entry.unpack(&dest).map_err(|e| SynthError::io(&dest, e))?;
      return Ok(dest);
    }
  }

  Err(extraction(format!("no {} found in vagrant box {}", name, box_file.display())))
}

/// Open a box as a tar archive, decompressing it when it starts with the gzip magic.
fn open_archive(box_file: &Path) -> Result<Archive<Box<dyn Read>>> {
  let open_err = |e: std::io::Error| extraction(format!("failed to open {}: {}", box_file.display(), e));

  let mut file = File::open(box_file).map_err(open_err)?;
  let mut magic = [0u8; 2];
  let is_gzip = match file.read_exact(&mut magic) {
    Ok(()) => magic == GZIP_MAGIC,
    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => false,
    Err(e) => return Err(open_err(e)),
  };
  file.seek(SeekFrom::Start(0)).map_err(open_err)?;

  let reader: Box<dyn Read> = if is_gzip {
    Box::new(GzDecoder::new(BufReader::new(file)))
  } else {
    Box::new(BufReader::new(file))
  };
  Ok(Archive::new(reader))
}

/// Drop `.` components so `./Vagrantfile` and `Vagrantfile` compare equal.
fn normalize(path: &Path) -> PathBuf {
  path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}

fn extraction(message: impl Into<String>) -> SynthError {
  SynthError::Extraction {
    message: message.into(),
  }
}
