//! WordPress (MySQL/MariaDB) legacy reader.
//!
//! Uses SQLx for connection pooling. Every column is cast in SQL so that
//! unsigned ids and zero dates decode without surprises: ids come back as
//! `SIGNED`, datetimes as text parsed here (the zero date becomes `None`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::Row;
use tracing::{info, warn};

use super::LegacyStore;
use crate::config::{mask_password, LegacyConfig};
use crate::error::{MigrateError, Result};
use crate::model::{LegacyPost, LegacyUser};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Format of MySQL DATETIME values cast to CHAR.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Legacy WordPress reader.
pub struct MysqlLegacyReader {
    pool: MySqlPool,
    users: String,
    posts: String,
    terms: String,
    term_taxonomy: String,
    term_relationships: String,
}

impl MysqlLegacyReader {
    /// Connect to the legacy database.
    pub async fn new(config: &LegacyConfig, max_conns: usize) -> Result<Self> {
        let ssl_mode = match config.ssl_mode.to_lowercase().as_str() {
            "disable" => {
                warn!("Legacy MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
                MySqlSslMode::Disabled
            }
            "require" => MySqlSslMode::Required,
            "prefer" => MySqlSslMode::Preferred,
            other => {
                warn!("Unknown ssl_mode '{}', defaulting to Preferred", other);
                MySqlSslMode::Preferred
            }
        };

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(ssl_mode);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_conns as u32)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| MigrateError::pool(e, "creating legacy MySQL pool"))?;

        if let Err(e) = sqlx::query("SELECT 1").fetch_one(&pool).await {
            pool.close().await;
            return Err(MigrateError::pool(e, "testing legacy MySQL connection"));
        }

        info!(
            "Connected to legacy database: {} (user: {}, password: {})",
            config.address(),
            config.user,
            mask_password(&config.password)
        );

        Ok(Self {
            pool,
            users: config.table("users"),
            posts: config.table("posts"),
            terms: config.table("terms"),
            term_taxonomy: config.table("term_taxonomy"),
            term_relationships: config.table("term_relationships"),
        })
    }

    fn user_from_row(row: &MySqlRow) -> Result<LegacyUser> {
        Ok(LegacyUser {
            id: row.try_get("id")?,
            login: row.try_get("user_login")?,
            nicename: row.try_get("user_nicename")?,
            email: row.try_get("user_email")?,
            display_name: row.try_get("display_name")?,
            registered: parse_datetime(row.try_get("user_registered")?),
            status: row.try_get("user_status")?,
            activation_key: row.try_get("user_activation_key")?,
        })
    }

    fn post_from_row(row: &MySqlRow) -> Result<LegacyPost> {
        Ok(LegacyPost {
            id: row.try_get("id")?,
            author: row.try_get("post_author")?,
            date: parse_datetime(row.try_get("post_date")?),
            date_gmt: parse_datetime(row.try_get("post_date_gmt")?),
            modified: parse_datetime(row.try_get("post_modified")?),
            modified_gmt: parse_datetime(row.try_get("post_modified_gmt")?),
            content: row.try_get("post_content")?,
            title: row.try_get("post_title")?,
            excerpt: row.try_get("post_excerpt")?,
            status: row.try_get("post_status")?,
            comment_status: row.try_get("comment_status")?,
            ping_status: row.try_get("ping_status")?,
            name: row.try_get("post_name")?,
            parent: row.try_get("post_parent")?,
            guid: row.try_get("guid")?,
            menu_order: row.try_get("menu_order")?,
            post_type: row.try_get("post_type")?,
            mime_type: row.try_get("post_mime_type")?,
            comment_count: row.try_get("comment_count")?,
        })
    }
}

/// Parse a DATETIME cast to text. Zero dates and NULL become `None`.
fn parse_datetime(value: Option<String>) -> Option<NaiveDateTime> {
    value.and_then(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT).ok())
}

#[async_trait]
impl LegacyStore for MysqlLegacyReader {
    async fn max_user_id(&self) -> Result<Option<i64>> {
        let sql = format!("SELECT CAST(MAX(ID) AS SIGNED) FROM {}", self.users);
        Ok(sqlx::query_scalar::<_, Option<i64>>(&sql)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<LegacyUser>> {
        let sql = format!(
            "SELECT
                CAST(ID AS SIGNED) AS id,
                user_login, user_nicename, user_email, display_name,
                CAST(user_registered AS CHAR) AS user_registered,
                CAST(user_status AS SIGNED) AS user_status,
                user_activation_key
             FROM {}
             WHERE ID = ?",
            self.users
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn max_post_id(&self) -> Result<Option<i64>> {
        let sql = format!("SELECT CAST(MAX(ID) AS SIGNED) FROM {}", self.posts);
        Ok(sqlx::query_scalar::<_, Option<i64>>(&sql)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn fetch_post(&self, id: i64) -> Result<Option<LegacyPost>> {
        let sql = format!(
            "SELECT
                CAST(ID AS SIGNED) AS id,
                CAST(post_author AS SIGNED) AS post_author,
                CAST(post_date AS CHAR) AS post_date,
                CAST(post_date_gmt AS CHAR) AS post_date_gmt,
                CAST(post_modified AS CHAR) AS post_modified,
                CAST(post_modified_gmt AS CHAR) AS post_modified_gmt,
                post_content, post_title, post_excerpt,
                post_status, comment_status, ping_status, post_name,
                CAST(post_parent AS SIGNED) AS post_parent,
                guid,
                CAST(menu_order AS SIGNED) AS menu_order,
                post_type, post_mime_type,
                CAST(comment_count AS SIGNED) AS comment_count
             FROM {}
             WHERE ID = ?",
            self.posts
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::post_from_row).transpose()
    }

    async fn term_relationships(&self, object_id: i64) -> Result<Vec<i64>> {
        let sql = format!(
            "SELECT CAST(term_taxonomy_id AS SIGNED)
             FROM {}
             WHERE object_id = ?
             ORDER BY term_taxonomy_id",
            self.term_relationships
        );
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .bind(object_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn term_taxonomy(&self, term_id: i64) -> Result<Option<String>> {
        let sql = format!(
            "SELECT CAST(taxonomy AS CHAR) FROM {} WHERE term_id = ? LIMIT 1",
            self.term_taxonomy
        );
        Ok(sqlx::query_scalar::<_, String>(&sql)
            .bind(term_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn term_name(&self, term_id: i64) -> Result<Option<String>> {
        let sql = format!(
            "SELECT CAST(name AS CHAR) FROM {} WHERE term_id = ? LIMIT 1",
            self.terms
        );
        Ok(sqlx::query_scalar::<_, String>(&sql)
            .bind(term_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MigrateError::pool(e, "testing legacy MySQL connection"))?;
        Ok(())
    }

    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
