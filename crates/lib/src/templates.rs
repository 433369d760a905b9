//! Bundled builder templates and the installer preseed.

use serde_json::{Map, Value};

use crate::error::Result;

pub const PRESEED_FILE_NAME: &str = "preseed.cfg";

/// Debian installer preseed. Contains `{user_account}` and `{user_password}`.
const PRESEED_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/preseed.cfg.template"));

const VIRTUALBOX_ISO_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/virtualbox-iso.json"));

const VIRTUALBOX_OVF_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/virtualbox-ovf.json"));

/// Base builder entries that mapped configuration fields are written over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderTemplate {
  VirtualboxIso,
  VirtualboxOvf,
}

impl BuilderTemplate {
  pub fn load(self) -> Result<Map<String, Value>> {
    let text = match self {
      BuilderTemplate::VirtualboxIso => VIRTUALBOX_ISO_JSON,
      BuilderTemplate::VirtualboxOvf => VIRTUALBOX_OVF_JSON,
    };
    Ok(serde_json::from_str(text)?)
  }
}

/// Render the preseed with the guest's login account.
pub fn render_preseed(user_account: &str, user_password: &str) -> String {
  render(PRESEED_TEMPLATE, &[("user_account", user_account), ("user_password", user_password)])
}

/// Single-pass `{name}` substitution. Braces not naming a substitution are
/// copied through, and substituted text is never rescanned.
fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(template.len());
  let mut rest = template;

  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];

    let replacement = after.find('}').and_then(|close| {
      let name = &after[..close];
      substitutions
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| (*value, close))
    });

    match replacement {
      Some((value, close)) => {
        out.push_str(value);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }

  out.push_str(rest);
  out
}
