//! Store abstractions for the legacy and target databases.
//!
//! - [`LegacyStore`]: point lookups into the WordPress schema (read-only)
//! - [`TargetStore`]: writes into the target content schema
//!
//! The engine holds both as `Arc<dyn ...>` and never sees SQL. The MySQL
//! implementations live in [`legacy`] and [`target`].

mod legacy;
mod target;

#[cfg(test)]
pub(crate) mod memory;

pub use legacy::MysqlLegacyReader;
pub use target::{MysqlTargetWriter, DEPENDENCIES_TABLE, POSTS_TABLE, TAGS_TABLE, USERS_TABLE};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{EntityKind, LegacyPost, LegacyUser, PostTagLink, Tag, TargetPost, TargetUser};

/// Read access to the legacy WordPress database.
///
/// All lookups are by identifier; a missing row is `Ok(None)`, never an error.
#[async_trait]
pub trait LegacyStore: Send + Sync {
    /// Highest user identifier, or `None` when the table is empty.
    async fn max_user_id(&self) -> Result<Option<i64>>;

    /// Fetch one user.
    async fn fetch_user(&self, id: i64) -> Result<Option<LegacyUser>>;

    /// Highest post identifier, or `None` when the table is empty.
    async fn max_post_id(&self) -> Result<Option<i64>>;

    /// Fetch one post row (any type).
    async fn fetch_post(&self, id: i64) -> Result<Option<LegacyPost>>;

    /// Taxonomy term identifiers attached to a post row.
    async fn term_relationships(&self, object_id: i64) -> Result<Vec<i64>>;

    /// Taxonomy kind of a term (`post_tag`, `category`, ...).
    async fn term_taxonomy(&self, term_id: i64) -> Result<Option<String>>;

    /// Display name of a term.
    async fn term_name(&self, term_id: i64) -> Result<Option<String>>;

    /// Run a trivial query to check connectivity.
    async fn test_connection(&self) -> Result<()>;

    /// Database type identifier for logging.
    fn db_type(&self) -> &str;

    /// Release all connections.
    async fn close(&self);
}

/// Write access to the target content database.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Create the four target tables. Fails if they already exist.
    async fn create_schema(&self) -> Result<()>;

    /// Highest migrated identifier for an entity kind.
    async fn max_id(&self, kind: EntityKind) -> Result<Option<i64>>;

    async fn insert_user(&self, user: &TargetUser) -> Result<()>;

    async fn insert_post(&self, post: &TargetPost) -> Result<()>;

    /// Replace title and content of an existing post.
    ///
    /// Returns the number of rows matched (0 when the post does not exist).
    async fn update_post_content(&self, id: i64, title: &str, content: &str) -> Result<u64>;

    /// Set the image of an existing post. Returns rows matched.
    async fn update_post_image(&self, id: i64, image: &str) -> Result<u64>;

    async fn tag_exists(&self, id: i64) -> Result<bool>;

    async fn insert_tag(&self, tag: &Tag) -> Result<()>;

    /// Whether the post is already linked to the tag.
    async fn link_exists(&self, link: &PostTagLink) -> Result<bool>;

    async fn insert_post_tag(&self, link: &PostTagLink) -> Result<()>;

    /// Run a trivial query to check connectivity.
    async fn test_connection(&self) -> Result<()>;

    /// Database type identifier for logging.
    fn db_type(&self) -> &str;

    /// Release all connections.
    async fn close(&self);
}
