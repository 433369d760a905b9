//! packermate-lib: configuration synthesis for Packer
//!
//! This crate turns a flat YAML configuration into a Packer build file:
//! - `Config`: bundled defaults, user file and overrides, with `(( name ))` expansion
//! - `mapper`: typed projection of flat keys onto builder fields
//! - `provisioner`: per-type schema validation of provisioner declarations
//! - `extract`: metadata recovered from packaged Vagrant boxes
//! - `Assembler`: per-target decision procedures producing the final result
//! - `packer`: writing `packer.json` and running `packer validate`/`build`

pub mod assemble;
pub mod config;
pub mod error;
pub mod extract;
pub mod json;
pub mod mapper;
pub mod packer;
pub mod params;
pub mod process;
pub mod provisioner;
pub mod templates;
pub mod value;
pub mod workdir;

#[cfg(test)]
mod testutil;

pub use assemble::{Assembler, AssemblyResult, Target};
pub use config::Config;
pub use error::{Result, SynthError, ValidationError};
pub use packer::BuildOptions;
pub use process::{ProcessRunner, SystemRunner};
