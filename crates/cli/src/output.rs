//! CLI output formatting utilities.
//!
//! Status lines go to stdout with a colored marker, errors to stderr.

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

/// Print a value in the same four-space layout as the generated packer.json.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = packermate_lib::json::to_pretty_string(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
