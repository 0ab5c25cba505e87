//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use crate::rewrite::ContentPipeline;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// Relative rule file paths are resolved against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Load and compile the three content rule sets.
    pub fn content_pipeline(&self) -> Result<ContentPipeline> {
        ContentPipeline::from_config(&self.rules, &self.base_dir)
    }
}

impl LegacyConfig {
    /// `host:port/database` for log lines.
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }

    /// Fully qualified legacy table name, e.g. `wp_posts`.
    pub fn table(&self, name: &str) -> String {
        format!("`{}{}`", self.table_prefix, name)
    }
}

impl TargetConfig {
    /// `host:port/database` for log lines.
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}
