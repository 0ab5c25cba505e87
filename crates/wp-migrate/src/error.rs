//! Error types for the migration library.

use thiserror::Error;

/// Exit code for configuration errors (YAML, rules, validation).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for legacy database errors.
pub const EXIT_LEGACY_ERROR: u8 = 2;
/// Exit code for target database errors.
pub const EXIT_TARGET_ERROR: u8 = 3;
/// Exit code for connection pool errors.
pub const EXIT_POOL_ERROR: u8 = 4;
/// Exit code for interactive prompt failures.
pub const EXIT_PROMPT_ERROR: u8 = 5;
/// Exit code for inconsistent legacy data.
pub const EXIT_DATA_ERROR: u8 = 6;
/// Exit code for IO errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A content rule failed to compile.
    #[error("Invalid {set} rule #{index} ({pattern:?}): {source}")]
    Rule {
        set: String,
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Legacy (WordPress) database query error
    #[error("Legacy database error: {0}")]
    Legacy(#[from] sqlx::Error),

    /// Target database query error
    #[error("Target database error: {0}")]
    Target(#[from] mysql_async::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A write to a target table failed
    #[error("Write to {table} failed: {message}")]
    Write { table: String, message: String },

    /// A post_tag term referenced by a post has no name row
    #[error("Taxonomy term {0} is a post_tag but has no name in the legacy terms table")]
    MissingTerm(i64),

    /// Interactive confirmation failed (no terminal, read error)
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Write error for a target table
    pub fn write(table: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Write {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a Rule error for a pattern that failed to compile
    pub fn rule(
        set: impl Into<String>,
        index: usize,
        pattern: impl Into<String>,
        source: regex::Error,
    ) -> Self {
        MigrateError::Rule {
            set: set.into(),
            index,
            pattern: pattern.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_)
            | MigrateError::Rule { .. }
            | MigrateError::Yaml(_)
            | MigrateError::Json(_) => EXIT_CONFIG_ERROR,
            MigrateError::Legacy(_) => EXIT_LEGACY_ERROR,
            MigrateError::Target(_) | MigrateError::Write { .. } => EXIT_TARGET_ERROR,
            MigrateError::Pool { .. } => EXIT_POOL_ERROR,
            MigrateError::Prompt(_) => EXIT_PROMPT_ERROR,
            MigrateError::MissingTerm(_) => EXIT_DATA_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
