//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cursor::CursorSpec;
use crate::rewrite::RulesConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Legacy WordPress database (read-only).
    pub legacy: LegacyConfig,

    /// Target content database.
    pub target: TargetConfig,

    /// Content rewriting rule sets.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,

    /// Directory relative rule file paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Legacy database (WordPress on MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// WordPress table prefix (default: "wp_").
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    /// TLS mode: disable, prefer, require (default: "prefer").
    #[serde(default = "default_prefer")]
    pub ssl_mode: String,
}

/// Target database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// TLS mode: disable, prefer, require, verify-ca, verify-full (default: "prefer").
    #[serde(default = "default_prefer")]
    pub ssl_mode: String,
}

impl fmt::Debug for LegacyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("table_prefix", &self.table_prefix)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Which post identifier tag links from a revision row are written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionTagKey {
    /// The revision's parent post, which is the row the revision updates.
    #[default]
    Parent,

    /// The revision's own identifier, as older migrations wrote it. Links
    /// may point at posts that do not exist.
    ///
    /// Tags are only resolved for revisions whose parent was migrated. Older
    /// migrations also created tags for orphaned revisions; this key does
    /// not, since an orphaned revision is skipped before its terms are read.
    Revision,
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Posts with fewer body characters than this go through the
    /// confirmation prompt when `--ask` is set (default: 2048).
    #[serde(default = "default_short_post_threshold")]
    pub short_post_threshold: usize,

    /// Post key for tag links created from revision rows (default: parent).
    #[serde(default)]
    pub revision_tag_key: RevisionTagKey,

    /// Maximum connections per database pool (default: 4).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            short_post_threshold: default_short_post_threshold(),
            revision_tag_key: RevisionTagKey::default(),
            max_connections: default_max_connections(),
        }
    }
}

/// Per-run options supplied by the operator on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    /// Create the target tables before migrating.
    pub create_schema: bool,

    /// Ask before migrating short posts.
    pub ask: bool,

    /// Where the users pass starts.
    pub users: CursorSpec,

    /// Where the posts pass starts.
    pub posts: CursorSpec,
}

/// Mask all but the first and last character of a password for display.
pub fn mask_password(password: &str) -> String {
    let count = password.chars().count();
    password
        .chars()
        .enumerate()
        .map(|(i, c)| if i == 0 || i + 1 == count { c } else { '*' })
        .collect()
}

// Default value functions for serde
fn default_mysql_port() -> u16 {
    3306
}

fn default_table_prefix() -> String {
    "wp_".to_string()
}

fn default_prefer() -> String {
    "prefer".to_string()
}

fn default_short_post_threshold() -> usize {
    2048
}

fn default_max_connections() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password() {
        assert_eq!(mask_password("secret"), "s****t");
        assert_eq!(mask_password("ab"), "ab");
        assert_eq!(mask_password("x"), "x");
        assert_eq!(mask_password(""), "");
        assert_eq!(mask_password("päss"), "p**s");
    }

    #[test]
    fn test_migration_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.short_post_threshold, 2048);
        assert_eq!(config.revision_tag_key, RevisionTagKey::Parent);
        assert_eq!(config.max_connections, 4);
    }
}
