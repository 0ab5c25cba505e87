//! Row types for the legacy (WordPress) and target schemas.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Taxonomy kind of legacy terms that become target tags.
pub const POST_TAG_TAXONOMY: &str = "post_tag";

/// A row of the legacy users table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyUser {
    pub id: i64,
    pub login: String,
    pub nicename: String,
    pub email: String,
    pub display_name: String,
    /// `None` when the column holds the MySQL zero date.
    pub registered: Option<NaiveDateTime>,
    pub status: i64,
    pub activation_key: String,
}

/// A row of the legacy posts table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyPost {
    pub id: i64,
    pub author: i64,
    /// Local creation time. `None` when the column holds the zero date.
    pub date: Option<NaiveDateTime>,
    pub date_gmt: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub modified_gmt: Option<NaiveDateTime>,
    pub content: String,
    pub title: String,
    pub excerpt: String,
    pub status: String,
    pub comment_status: String,
    pub ping_status: String,
    pub name: String,
    pub parent: i64,
    pub guid: String,
    pub menu_order: i64,
    pub post_type: String,
    pub mime_type: String,
    pub comment_count: i64,
}

/// Classification of a legacy post row by its type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostKind {
    Post,
    Revision,
    Attachment,
    /// Pages, menu items, custom types. Never migrated.
    Other(String),
}

impl PostKind {
    /// Whether rows of this kind take part in the migration.
    pub fn is_eligible(&self) -> bool {
        !matches!(self, PostKind::Other(_))
    }
}

/// A row of the target users table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A row of the target posts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPost {
    pub id: i64,
    pub author: i64,
    /// Unix timestamp in seconds.
    pub date: i64,
    pub title: String,
    pub image: String,
    pub content: String,
}

/// A row of the target tags table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A post-to-tag association in the target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTagLink {
    pub post_id: i64,
    pub tag_id: i64,
}

/// Entity kinds that carry a resume cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Post,
}

impl EntityKind {
    /// Plural noun used in progress messages.
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Post => "posts",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Post => "post",
        }
    }
}
