//! Default settings template.
//!
//! `CLASSIC Main.yaml` carries the default user settings as a literal block of
//! YAML text:
//!
//! ```yaml
//! CLASSIC_Info:
//!   default_settings: |
//!     CLASSIC_Settings:
//!       Update Check: true
//!       FCX Mode: false
//! ```
//!
//! When `CLASSIC Settings.yaml` does not exist, the lines under
//! `CLASSIC_Settings:` become the new settings file, de-indented but otherwise
//! as shipped, comments and quoting included.

use crate::document::{Node, navigate};
use crate::{Error, Result};
use std::path::PathBuf;

/// Dotted path of the template text inside `Main`.
pub const TEMPLATE_KEY: &str = "CLASSIC_Info.default_settings";

/// Top-level key of the settings mapping inside the template.
pub const SETTINGS_SECTION: &str = "CLASSIC_Settings";

/// Pull the default settings mapping out of `Main`'s root.
pub fn extract_defaults(main: &Node) -> Result<Node> {
    let missing = || Error::MissingTemplate {
        key: TEMPLATE_KEY.to_string(),
    };

    let text = navigate::get(main, TEMPLATE_KEY)?
        .and_then(Node::as_str)
        .ok_or_else(missing)?;

    let template: Node = serde_yaml::from_str(text).map_err(|source| Error::Parse {
        path: PathBuf::from(TEMPLATE_KEY),
        source,
    })?;

    match template.get(SETTINGS_SECTION) {
        Some(section @ Node::Mapping(_)) => Ok(section.clone()),
        _ => Err(Error::MissingTemplate {
            key: format!("{}: {}", TEMPLATE_KEY, SETTINGS_SECTION),
        }),
    }
}

/// Render the default settings file contents from `Main`'s root.
///
/// Uses the template's own text for the section when it parses to the same
/// mapping, and a fresh serialization otherwise (flow style, anchors).
pub fn render_defaults(main: &Node) -> Result<String> {
    let defaults = extract_defaults(main)?;

    let verbatim = navigate::get(main, TEMPLATE_KEY)?
        .and_then(Node::as_str)
        .and_then(section_text)
        .filter(|text| serde_yaml::from_str::<Node>(text).ok().as_ref() == Some(&defaults));

    match verbatim {
        Some(text) => Ok(text),
        None => Ok(serde_yaml::to_string(&defaults)?),
    }
}

/// The block under a top-level `CLASSIC_Settings:` line, with its common
/// indentation removed.
fn section_text(template: &str) -> Option<String> {
    let header = format!("{}:", SETTINGS_SECTION);
    let mut lines = template.lines();
    lines.by_ref().find(|line| line.trim_end() == header)?;

    let mut body: Vec<&str> = lines
        .take_while(|line| line.trim().is_empty() || line.starts_with([' ', '\t']))
        .collect();
    while body.last().is_some_and(|line| line.trim().is_empty()) {
        body.pop();
    }

    let indent = body
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()?;

    let mut text = String::new();
    for line in body {
        text.push_str(line.get(indent..).unwrap_or("").trim_end());
        text.push('\n');
    }
    Some(text)
}
