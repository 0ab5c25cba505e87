//! # wp-migrate
//!
//! Resumable migration of WordPress content into a simplified schema.
//!
//! The library walks the legacy `users` and `posts` tables one identifier at
//! a time and writes:
//!
//! - **Users** keyed by their legacy id
//! - **Posts** with bodies rewritten by configurable regex rule sets
//! - **Revisions** folded into their parent post
//! - **Attachments** as the image of their parent post
//! - **Tags** deduplicated across posts, plus post/tag links
//!
//! An interrupted run is resumed by starting each pass after the highest
//! identifier already present in the target.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wp_migrate::{AcceptAll, Config, CursorSpec, Orchestrator, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> wp_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let options = RunOptions {
//!         users: CursorSpec::resume(),
//!         posts: CursorSpec::resume(),
//!         ..RunOptions::default()
//!     };
//!     let result = orchestrator.run(options, Arc::new(AcceptAll)).await?;
//!     println!("Migrated {} posts", result.posts.inserted);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod rewrite;
pub mod store;
pub mod tags;
pub mod transform;

// Re-exports for convenient access
pub use config::{Config, LegacyConfig, MigrationConfig, RevisionTagKey, RunOptions, TargetConfig};
pub use cursor::CursorSpec;
pub use engine::{AcceptAll, GateDecision, MigrationEngine, PostPassStats, ShortPostGate, UserPassStats};
pub use error::{MigrateError, Result};
pub use model::LegacyPost;
pub use orchestrator::{HealthCheckResult, MigrationResult, Orchestrator};
pub use rewrite::{ContentPipeline, RuleSet, RuleSpec};
