//! Target content database writer.
//!
//! Uses mysql_async for connection pooling. Rows are written one statement
//! at a time, so every committed row is visible to the next run's resume
//! cursor query.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, SslOpts};
use tracing::{info, warn};

use super::TargetStore;
use crate::config::{mask_password, TargetConfig};
use crate::error::{MigrateError, Result};
use crate::model::{EntityKind, PostTagLink, Tag, TargetPost, TargetUser};

pub const USERS_TABLE: &str = "LegacyUsers";
pub const TAGS_TABLE: &str = "LegacyTags";
pub const POSTS_TABLE: &str = "LegacyPosts";
pub const DEPENDENCIES_TABLE: &str = "LegacyDependencies";

/// Target schema DDL, in creation order.
const SCHEMA_DDL: [&str; 4] = [
    "CREATE TABLE LegacyUsers (
        Id INT PRIMARY KEY,
        Username VARCHAR(128) NOT NULL DEFAULT '',
        Email VARCHAR(512) NOT NULL DEFAULT ''
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE LegacyTags (
        Id INT PRIMARY KEY,
        Tag VARCHAR(64) NOT NULL DEFAULT ''
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE LegacyPosts (
        Id INT PRIMARY KEY,
        Author INT NOT NULL DEFAULT 0,
        Date BIGINT NOT NULL DEFAULT 0,
        Title VARCHAR(256) NOT NULL DEFAULT '',
        Image VARCHAR(512) NOT NULL DEFAULT '',
        Content LONGTEXT NOT NULL,
        FOREIGN KEY (Author) REFERENCES LegacyUsers (Id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE LegacyDependencies (
        PostId INT NOT NULL DEFAULT 0,
        TagId INT NOT NULL DEFAULT 0,
        FOREIGN KEY (PostId) REFERENCES LegacyPosts (Id),
        FOREIGN KEY (TagId) REFERENCES LegacyTags (Id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
];

/// MySQL target writer.
pub struct MysqlTargetWriter {
    pool: Pool,
}

impl MysqlTargetWriter {
    /// Connect to the target database.
    pub async fn new(config: &TargetConfig, max_conns: usize) -> Result<Self> {
        let ssl_opts = match config.ssl_mode.to_lowercase().as_str() {
            "disable" => {
                warn!("Target MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
                None
            }
            "prefer" | "require" => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
            "verify-ca" | "verify_ca" | "verify-full" | "verify_identity" => Some(SslOpts::default()),
            other => {
                warn!("Unknown ssl_mode '{}', defaulting to Preferred", other);
                Some(SslOpts::default().with_danger_accept_invalid_certs(true))
            }
        };

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(config.host.as_str())
            .tcp_port(config.port)
            .db_name(Some(config.database.as_str()))
            .user(Some(config.user.as_str()))
            .pass(Some(config.password.as_str()))
            // Report matched rather than changed rows for UPDATE
            .client_found_rows(true)
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = ssl_opts {
            builder = builder.ssl_opts(ssl);
        }

        let constraints = PoolConstraints::new(1, max_conns.max(1)).ok_or_else(|| {
            MigrateError::Config(format!("invalid target pool size {}", max_conns))
        })?;
        let pool_opts = PoolOpts::new().with_constraints(constraints);

        let opts: Opts = builder.pool_opts(pool_opts).into();
        let pool = Pool::new(opts);

        let writer = Self { pool };
        if let Err(e) = writer.test_connection().await {
            writer.close().await;
            return Err(e);
        }

        info!(
            "Connected to target database: {} (user: {}, password: {})",
            config.address(),
            config.user,
            mask_password(&config.password)
        );

        Ok(writer)
    }

    async fn conn(&self) -> Result<Conn> {
        self.pool
            .get_conn()
            .await
            .map_err(|e| MigrateError::pool(e, "getting target MySQL connection"))
    }

    fn table_for(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::User => USERS_TABLE,
            EntityKind::Post => POSTS_TABLE,
        }
    }
}

#[async_trait]
impl TargetStore for MysqlTargetWriter {
    async fn create_schema(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        for ddl in SCHEMA_DDL {
            conn.query_drop(ddl).await?;
        }
        info!("Created target tables");
        Ok(())
    }

    async fn max_id(&self, kind: EntityKind) -> Result<Option<i64>> {
        let mut conn = self.conn().await?;
        let sql = format!("SELECT MAX(Id) FROM {}", Self::table_for(kind));
        let max: Option<Option<i64>> = conn.query_first(sql).await?;
        Ok(max.flatten())
    }

    async fn insert_user(&self, user: &TargetUser) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.exec_drop(
            "INSERT INTO LegacyUsers (Id, Username, Email) VALUES (?, ?, ?)",
            (user.id, user.username.as_str(), user.email.as_str()),
        )
        .await
        .map_err(|e| MigrateError::write(USERS_TABLE, e))
    }

    async fn insert_post(&self, post: &TargetPost) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.exec_drop(
            "INSERT INTO LegacyPosts (Id, Author, Date, Title, Image, Content)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                post.id,
                post.author,
                post.date,
                post.title.as_str(),
                post.image.as_str(),
                post.content.as_str(),
            ),
        )
        .await
        .map_err(|e| MigrateError::write(POSTS_TABLE, e))
    }

    async fn update_post_content(&self, id: i64, title: &str, content: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        conn.exec_drop(
            "UPDATE LegacyPosts SET Title = ?, Content = ? WHERE Id = ?",
            (title, content, id),
        )
        .await
        .map_err(|e| MigrateError::write(POSTS_TABLE, e))?;
        Ok(conn.affected_rows())
    }

    async fn update_post_image(&self, id: i64, image: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        conn.exec_drop("UPDATE LegacyPosts SET Image = ? WHERE Id = ?", (image, id))
            .await
            .map_err(|e| MigrateError::write(POSTS_TABLE, e))?;
        Ok(conn.affected_rows())
    }

    async fn tag_exists(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn().await?;
        let found: Option<i64> = conn
            .exec_first("SELECT Id FROM LegacyTags WHERE Id = ?", (id,))
            .await?;
        Ok(found.is_some())
    }

    async fn insert_tag(&self, tag: &Tag) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.exec_drop(
            "INSERT INTO LegacyTags (Id, Tag) VALUES (?, ?)",
            (tag.id, tag.name.as_str()),
        )
        .await
        .map_err(|e| MigrateError::write(TAGS_TABLE, e))
    }

    async fn link_exists(&self, link: &PostTagLink) -> Result<bool> {
        let mut conn = self.conn().await?;
        let found: Option<i64> = conn
            .exec_first(
                "SELECT 1 FROM LegacyDependencies WHERE PostId = ? AND TagId = ? LIMIT 1",
                (link.post_id, link.tag_id),
            )
            .await?;
        Ok(found.is_some())
    }

    async fn insert_post_tag(&self, link: &PostTagLink) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.exec_drop(
            "INSERT INTO LegacyDependencies (PostId, TagId) VALUES (?, ?)",
            (link.post_id, link.tag_id),
        )
        .await
        .map_err(|e| MigrateError::write(DEPENDENCIES_TABLE, e))
    }

    async fn test_connection(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::pool(e, "testing target MySQL connection"))?;
        Ok(())
    }

    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn close(&self) {
        if let Err(e) = self.pool.clone().disconnect().await {
            warn!("Error closing target pool: {}", e);
        }
    }
}
