//! Where rule sets come from: inline YAML lists or JSON rule files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RuleSpec;
use crate::error::Result;

/// A rule set given either inline or as a path to a JSON file.
///
/// ```yaml
/// rules:
///   comment: rules/wpc.json
///   spacer:
///     - pattern: '<div class="wp-block-spacer"[^>]*></div>'
///       replacement: ''
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSource {
    /// JSON file holding an array of `{ "pattern", "replacement" }` objects.
    File(PathBuf),
    Inline(Vec<RuleSpec>),
}

impl Default for RuleSource {
    fn default() -> Self {
        RuleSource::Inline(Vec::new())
    }
}

impl RuleSource {
    /// Read the rule specs. Relative file paths resolve against `base_dir`.
    pub fn load(&self, base_dir: &Path) -> Result<Vec<RuleSpec>> {
        match self {
            RuleSource::Inline(specs) => Ok(specs.clone()),
            RuleSource::File(path) => {
                let path = if path.is_relative() {
                    base_dir.join(path)
                } else {
                    path.clone()
                };
                debug!("Reading rules from {:?}", path);
                let content = std::fs::read_to_string(&path)?;
                Ok(serde_json::from_str(&content)?)
            }
        }
    }
}

/// The `rules` section of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Comment markup removal.
    #[serde(default)]
    pub comment: RuleSource,

    /// Spacer markup removal.
    #[serde(default)]
    pub spacer: RuleSource,

    /// Media URL rewriting.
    #[serde(default)]
    pub media: RuleSource,
}
