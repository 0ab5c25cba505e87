//! In-memory stores for engine tests.
//!
//! The target enforces the same keys as the MySQL schema: unique ids,
//! post authors must exist, links must reference existing posts and tags.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{LegacyStore, TargetStore, DEPENDENCIES_TABLE, POSTS_TABLE, TAGS_TABLE, USERS_TABLE};
use crate::error::{MigrateError, Result};
use crate::model::{
    EntityKind, LegacyPost, LegacyUser, PostTagLink, Tag, TargetPost, TargetUser,
};

#[derive(Default)]
pub struct MemoryLegacy {
    pub users: BTreeMap<i64, LegacyUser>,
    pub posts: BTreeMap<i64, LegacyPost>,
    pub relationships: HashMap<i64, Vec<i64>>,
    pub taxonomy: HashMap<i64, String>,
    pub names: HashMap<i64, String>,
    /// Post fetch that fails, to simulate a lost legacy connection.
    pub fail_fetch_post: Option<i64>,
    /// Taxonomy lookup that fails.
    pub fail_term_taxonomy: Option<i64>,
    /// Term name lookup that fails.
    pub fail_term_name: Option<i64>,
}

impl MemoryLegacy {
    pub fn with_user(mut self, id: i64) -> Self {
        self.users.insert(id, user(id));
        self
    }

    pub fn with_post(mut self, post: LegacyPost) -> Self {
        self.posts.insert(post.id, post);
        self
    }

    pub fn with_term(mut self, term_id: i64, taxonomy: &str, name: &str) -> Self {
        self.taxonomy.insert(term_id, taxonomy.to_string());
        self.names.insert(term_id, name.to_string());
        self
    }

    pub fn with_relationship(mut self, object_id: i64, term_id: i64) -> Self {
        self.relationships.entry(object_id).or_default().push(term_id);
        self
    }
}

pub fn user(id: i64) -> LegacyUser {
    LegacyUser {
        id,
        login: format!("login{id}"),
        nicename: format!("user-{id}"),
        email: format!("user{id}@example.com"),
        display_name: format!("User {id}"),
        registered: None,
        status: 0,
        activation_key: String::new(),
    }
}

/// A legacy post row of the given type, authored by user 1.
pub fn post(id: i64, post_type: &str, parent: i64, content: &str) -> LegacyPost {
    LegacyPost {
        id,
        author: 1,
        date: NaiveDate::from_ymd_opt(2020, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5)),
        title: format!("Title {id}"),
        content: content.to_string(),
        parent,
        post_type: post_type.to_string(),
        status: "publish".to_string(),
        ..LegacyPost::default()
    }
}

#[async_trait]
impl LegacyStore for MemoryLegacy {
    async fn max_user_id(&self) -> Result<Option<i64>> {
        Ok(self.users.keys().next_back().copied())
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<LegacyUser>> {
        Ok(self.users.get(&id).cloned())
    }

    async fn max_post_id(&self) -> Result<Option<i64>> {
        Ok(self.posts.keys().next_back().copied())
    }

    async fn fetch_post(&self, id: i64) -> Result<Option<LegacyPost>> {
        if self.fail_fetch_post == Some(id) {
            return Err(MigrateError::Legacy(sqlx::Error::PoolTimedOut));
        }
        Ok(self.posts.get(&id).cloned())
    }

    async fn term_relationships(&self, object_id: i64) -> Result<Vec<i64>> {
        Ok(self.relationships.get(&object_id).cloned().unwrap_or_default())
    }

    async fn term_taxonomy(&self, term_id: i64) -> Result<Option<String>> {
        if self.fail_term_taxonomy == Some(term_id) {
            return Err(MigrateError::Legacy(sqlx::Error::PoolTimedOut));
        }
        Ok(self.taxonomy.get(&term_id).cloned())
    }

    async fn term_name(&self, term_id: i64) -> Result<Option<String>> {
        if self.fail_term_name == Some(term_id) {
            return Err(MigrateError::Legacy(sqlx::Error::PoolTimedOut));
        }
        Ok(self.names.get(&term_id).cloned())
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {}
}

#[derive(Debug, Default, Clone)]
pub struct TargetTables {
    pub users: BTreeMap<i64, TargetUser>,
    pub posts: BTreeMap<i64, TargetPost>,
    pub tags: BTreeMap<i64, Tag>,
    pub links: Vec<PostTagLink>,
    /// Count of successful INSERT statements.
    pub inserts: usize,
    pub schema_created: bool,
    pub closed: bool,
}

#[derive(Default)]
pub struct MemoryTarget {
    pub tables: Mutex<TargetTables>,
    /// Post insert that fails, to simulate a write error mid-pass.
    pub fail_post_insert: Mutex<Option<i64>>,
}

impl MemoryTarget {
    pub fn snapshot(&self) -> TargetTables {
        self.tables.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetStore for MemoryTarget {
    async fn create_schema(&self) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.schema_created {
            return Err(MigrateError::write(USERS_TABLE, "table already exists"));
        }
        tables.schema_created = true;
        Ok(())
    }

    async fn max_id(&self, kind: EntityKind) -> Result<Option<i64>> {
        let tables = self.tables.lock().unwrap();
        Ok(match kind {
            EntityKind::User => tables.users.keys().next_back().copied(),
            EntityKind::Post => tables.posts.keys().next_back().copied(),
        })
    }

    async fn insert_user(&self, user: &TargetUser) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.contains_key(&user.id) {
            return Err(MigrateError::write(USERS_TABLE, "duplicate primary key"));
        }
        tables.users.insert(user.id, user.clone());
        tables.inserts += 1;
        Ok(())
    }

    async fn insert_post(&self, post: &TargetPost) -> Result<()> {
        if *self.fail_post_insert.lock().unwrap() == Some(post.id) {
            return Err(MigrateError::write(POSTS_TABLE, "connection lost"));
        }
        let mut tables = self.tables.lock().unwrap();
        if tables.posts.contains_key(&post.id) {
            return Err(MigrateError::write(POSTS_TABLE, "duplicate primary key"));
        }
        if !tables.users.contains_key(&post.author) {
            return Err(MigrateError::write(POSTS_TABLE, "author foreign key"));
        }
        tables.posts.insert(post.id, post.clone());
        tables.inserts += 1;
        Ok(())
    }

    async fn update_post_content(&self, id: i64, title: &str, content: &str) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        Ok(match tables.posts.get_mut(&id) {
            Some(post) => {
                post.title = title.to_string();
                post.content = content.to_string();
                1
            }
            None => 0,
        })
    }

    async fn update_post_image(&self, id: i64, image: &str) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        Ok(match tables.posts.get_mut(&id) {
            Some(post) => {
                post.image = image.to_string();
                1
            }
            None => 0,
        })
    }

    async fn tag_exists(&self, id: i64) -> Result<bool> {
        Ok(self.tables.lock().unwrap().tags.contains_key(&id))
    }

    async fn insert_tag(&self, tag: &Tag) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.tags.contains_key(&tag.id) {
            return Err(MigrateError::write(TAGS_TABLE, "duplicate primary key"));
        }
        tables.tags.insert(tag.id, tag.clone());
        tables.inserts += 1;
        Ok(())
    }

    async fn link_exists(&self, link: &PostTagLink) -> Result<bool> {
        Ok(self.tables.lock().unwrap().links.contains(link))
    }

    async fn insert_post_tag(&self, link: &PostTagLink) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.posts.contains_key(&link.post_id) {
            return Err(MigrateError::write(DEPENDENCIES_TABLE, "post foreign key"));
        }
        if !tables.tags.contains_key(&link.tag_id) {
            return Err(MigrateError::write(DEPENDENCIES_TABLE, "tag foreign key"));
        }
        tables.links.push(*link);
        tables.inserts += 1;
        Ok(())
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    fn db_type(&self) -> &str {
        "memory"
    }

    async fn close(&self) {
        self.tables.lock().unwrap().closed = true;
    }
}
