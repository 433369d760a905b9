//! JSON encodings used in generated Packer configuration.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};

/// Single-line formatter that separates items with `", "` and keys from
/// values with `": "`, e.g. `{"a": 1, "b": [1, 2]}`.
#[derive(Debug, Default, Clone, Copy)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
  fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
    if first { Ok(()) } else { writer.write_all(b", ") }
  }

  fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
    if first { Ok(()) } else { writer.write_all(b", ") }
  }

  fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
    writer.write_all(b": ")
  }
}

/// Encode a value on one line with spaced separators.
pub fn to_spaced_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
  encode(value, SpacedFormatter)
}

/// Encode a value across lines with four-space indentation.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
  encode(value, PrettyFormatter::with_indent(b"    "))
}

fn encode<T: Serialize + ?Sized, F: Formatter>(value: &T, formatter: F) -> Result<String, serde_json::Error> {
  let mut buf = Vec::new();
  let mut serializer = Serializer::with_formatter(&mut buf, formatter);
  value.serialize(&mut serializer)?;
  // serde_json only ever writes valid UTF-8
  Ok(String::from_utf8_lossy(&buf).into_owned())
}
