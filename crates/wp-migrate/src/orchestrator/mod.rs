//! Migration orchestrator - main workflow coordinator.

use crate::config::{Config, RevisionTagKey, RunOptions};
use crate::cursor::resolve_start;
use crate::engine::{MigrationEngine, PostPassStats, ShortPostGate, UserPassStats};
use crate::error::Result;
use crate::model::EntityKind;
use crate::rewrite::ContentPipeline;
use crate::store::{LegacyStore, MysqlLegacyReader, MysqlTargetWriter, TargetStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    pipeline: Arc<ContentPipeline>,
    legacy: Arc<dyn LegacyStore>,
    target: Arc<dyn TargetStore>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// First user identifier visited.
    pub users_start: i64,

    /// First post identifier visited.
    pub posts_start: i64,

    pub users: UserPassStats,

    pub posts: PostPassStats,
}

/// Connectivity report for both databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub legacy_connected: bool,
    pub legacy_latency_ms: u64,
    pub legacy_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    pub target_error: Option<String>,
    pub healthy: bool,
}

impl Orchestrator {
    /// Compile the content rules and connect to both databases.
    ///
    /// Both connections are opened concurrently. If one fails, the other is
    /// closed before the error is returned.
    pub async fn new(config: Config) -> Result<Self> {
        let pipeline = config.content_pipeline()?;

        let max_conns = config.migration.max_connections;
        let (legacy, target) = tokio::join!(
            MysqlLegacyReader::new(&config.legacy, max_conns),
            MysqlTargetWriter::new(&config.target, max_conns),
        );

        let (legacy, target) = match (legacy, target) {
            (Ok(legacy), Ok(target)) => (legacy, target),
            (Ok(legacy), Err(e)) => {
                legacy.close().await;
                return Err(e);
            }
            (Err(e), Ok(target)) => {
                target.close().await;
                return Err(e);
            }
            (Err(e), Err(target_err)) => {
                warn!("Target connection also failed: {}", target_err);
                return Err(e);
            }
        };

        Ok(Self::with_stores(
            config,
            Arc::new(legacy),
            Arc::new(target),
            pipeline,
        ))
    }

    /// Build an orchestrator over already connected stores.
    pub fn with_stores(
        config: Config,
        legacy: Arc<dyn LegacyStore>,
        target: Arc<dyn TargetStore>,
        pipeline: ContentPipeline,
    ) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
            legacy,
            target,
        }
    }

    /// Run the migration. Connections are closed whatever the outcome.
    ///
    /// `gate` is consulted for short posts only when `options.ask` is set.
    pub async fn run(
        self,
        options: RunOptions,
        gate: Arc<dyn ShortPostGate>,
    ) -> Result<MigrationResult> {
        let result = self.execute(options, gate).await;
        self.close().await;
        result
    }

    async fn execute(
        &self,
        options: RunOptions,
        gate: Arc<dyn ShortPostGate>,
    ) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!(
            "Starting migration run: {} ({} -> {})",
            run_id,
            self.legacy.db_type(),
            self.target.db_type()
        );

        if options.create_schema {
            info!("Creating target tables");
            self.target.create_schema().await?;
        }

        if self.config.migration.revision_tag_key == RevisionTagKey::Revision {
            warn!("Tag links from revisions use the revision id and may reference posts that do not exist");
        }

        let target = self.target.as_ref();
        let (users_start, posts_start) = tokio::try_join!(
            resolve_start(target, EntityKind::User, options.users, options.create_schema),
            resolve_start(target, EntityKind::Post, options.posts, options.create_schema),
        )?;

        let mut engine = MigrationEngine::new(
            self.legacy.clone(),
            self.target.clone(),
            self.pipeline.clone(),
            self.config.migration.clone(),
        );
        if options.ask {
            engine = engine.with_gate(gate);
        }

        let users = engine.migrate_users(users_start).await?;
        let posts = engine.migrate_posts(posts_start).await?;

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let result = MigrationResult {
            run_id,
            status: "completed".to_string(),
            started_at,
            completed_at,
            duration_seconds: duration,
            users_start,
            posts_start,
            users,
            posts,
        };

        info!(
            "Migration {}: {} users, {} posts written in {:.1}s",
            result.status,
            result.users.inserted,
            result.posts.posts_written(),
            result.duration_seconds
        );

        Ok(result)
    }

    /// Test both connections concurrently.
    pub async fn health_check(&self) -> Result<HealthCheckResult> {
        let (legacy, target) = tokio::join!(
            timed(self.legacy.test_connection()),
            timed(self.target.test_connection()),
        );

        let (legacy_latency_ms, legacy_error) = legacy;
        let (target_latency_ms, target_error) = target;

        Ok(HealthCheckResult {
            legacy_connected: legacy_error.is_none(),
            legacy_latency_ms,
            target_connected: target_error.is_none(),
            target_latency_ms,
            healthy: legacy_error.is_none() && target_error.is_none(),
            legacy_error,
            target_error,
        })
    }

    /// Release both connection pools.
    pub async fn close(&self) {
        tokio::join!(self.legacy.close(), self.target.close());
        info!("Database connections closed");
    }
}

async fn timed<F>(check: F) -> (u64, Option<String>)
where
    F: Future<Output = Result<()>>,
{
    let start = Instant::now();
    let outcome = check.await;
    let elapsed = start.elapsed().as_millis() as u64;
    (elapsed, outcome.err().map(|e| e.to_string()))
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorSpec;
    use crate::engine::{AcceptAll, GateDecision};
    use crate::error::MigrateError;
    use crate::model::{LegacyPost, PostTagLink};
    use crate::store::memory::{post, MemoryLegacy, MemoryTarget};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const YAML: &str = r#"
legacy:
  host: localhost
  database: wordpress
  user: wp
target:
  host: localhost
  database: content
  user: app
rules:
  comment:
    - pattern: "(?s)<!--.*?-->"
  spacer:
    - pattern: "(&nbsp;\\s*)+"
      replacement: " "
  media:
    - pattern: "https?://blog\\.example\\.com/wp-content/uploads/"
      replacement: "/media/"
"#;

    fn legacy() -> MemoryLegacy {
        let body = "text ".repeat(500);
        let mut attachment = post(4, "attachment", 2, "");
        attachment.guid = "https://blog.example.com/wp-content/uploads/2021/03/hero.jpg".into();

        MemoryLegacy::default()
            .with_user(1)
            .with_user(2)
            .with_post(post(1, "page", 0, &body))
            .with_post(post(2, "post", 0, &format!("<!-- wp:paragraph -->{body}")))
            .with_post(post(3, "revision", 2, &body))
            .with_post(attachment)
            .with_post(post(6, "post", 0, &body))
            .with_term(10, "post_tag", "news")
            .with_term(11, "category", "General")
            .with_relationship(2, 10)
            .with_relationship(2, 11)
            .with_relationship(6, 10)
    }

    fn orchestrator(legacy: MemoryLegacy, target: &Arc<MemoryTarget>) -> Orchestrator {
        let config = Config::from_yaml(YAML).unwrap();
        let pipeline = config.content_pipeline().unwrap();
        Orchestrator::with_stores(config, Arc::new(legacy), target.clone(), pipeline)
    }

    fn fresh() -> RunOptions {
        RunOptions {
            create_schema: true,
            ..RunOptions::default()
        }
    }

    fn resume() -> RunOptions {
        RunOptions {
            users: CursorSpec::resume(),
            posts: CursorSpec::resume(),
            ..RunOptions::default()
        }
    }

    #[derive(Default)]
    struct RecordingGate {
        asked: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl ShortPostGate for RecordingGate {
        async fn decide(&self, post: &LegacyPost) -> Result<GateDecision> {
            self.asked.lock().unwrap().push(post.id);
            Ok(GateDecision::Skip)
        }
    }

    #[tokio::test]
    async fn test_full_run() {
        let target = Arc::new(MemoryTarget::default());
        let result = orchestrator(legacy(), &target)
            .run(fresh(), Arc::new(AcceptAll))
            .await
            .unwrap();

        assert_eq!(result.status, "completed");
        assert_eq!(result.users.inserted, 2);
        assert_eq!(result.posts.inserted, 2);
        assert_eq!(result.posts.revisions_applied, 1);
        assert_eq!(result.posts.images_applied, 1);
        assert_eq!(result.posts.ineligible, 1);
        assert_eq!(result.posts.missing, 1);
        assert_eq!(result.posts.tags_created, 1);
        assert_eq!(result.posts.links_created, 2);
        assert_eq!(result.posts.terms_ignored, 1);

        let tables = target.snapshot();
        assert!(tables.schema_created);
        assert!(tables.closed);
        assert_eq!(tables.posts[&2].image, "/media/2021/03/hero.jpg");
        assert!(!tables.posts[&2].content.contains("<!--"));
    }

    #[tokio::test]
    async fn test_resume_after_full_run_inserts_nothing() {
        let target = Arc::new(MemoryTarget::default());
        orchestrator(legacy(), &target)
            .run(fresh(), Arc::new(AcceptAll))
            .await
            .unwrap();
        let inserts = target.snapshot().inserts;

        let result = orchestrator(legacy(), &target)
            .run(resume(), Arc::new(AcceptAll))
            .await
            .unwrap();

        assert_eq!(result.users_start, 3);
        assert_eq!(result.posts_start, 7);
        assert_eq!(result.users.scanned, 0);
        assert_eq!(result.posts.scanned, 0);
        assert_eq!(target.snapshot().inserts, inserts);
    }

    #[tokio::test]
    async fn test_resume_over_tagged_revision_keeps_single_link() {
        let tagged = || {
            MemoryLegacy::default()
                .with_user(1)
                .with_post(post(2, "post", 0, &"text ".repeat(500)))
                .with_post(post(3, "revision", 2, &"text ".repeat(500)))
                .with_term(10, "post_tag", "news")
                .with_relationship(3, 10)
        };
        let target = Arc::new(MemoryTarget::default());
        orchestrator(tagged(), &target)
            .run(fresh(), Arc::new(AcceptAll))
            .await
            .unwrap();
        let inserts = target.snapshot().inserts;

        let result = orchestrator(tagged(), &target)
            .run(resume(), Arc::new(AcceptAll))
            .await
            .unwrap();

        // The trailing revision is revisited because it is not a target row.
        assert_eq!(result.posts_start, 3);
        assert_eq!(result.posts.revisions_applied, 1);
        assert_eq!(result.posts.links_created, 0);
        assert_eq!(result.posts.links_existing, 1);
        let tables = target.snapshot();
        assert_eq!(tables.inserts, inserts);
        assert_eq!(tables.links, vec![PostTagLink { post_id: 2, tag_id: 10 }]);
    }

    #[tokio::test]
    async fn test_resume_after_write_error() {
        let target = Arc::new(MemoryTarget::default());
        *target.fail_post_insert.lock().unwrap() = Some(6);

        let err = orchestrator(legacy(), &target)
            .run(fresh(), Arc::new(AcceptAll))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Write { .. }));
        assert!(target.snapshot().closed);

        *target.fail_post_insert.lock().unwrap() = None;
        let result = orchestrator(legacy(), &target)
            .run(resume(), Arc::new(AcceptAll))
            .await
            .unwrap();

        assert_eq!(result.users.scanned, 0);
        assert_eq!(result.posts_start, 3);
        assert_eq!(result.posts.inserted, 1);
        let ids: Vec<i64> = target.snapshot().posts.keys().copied().collect();
        assert_eq!(ids, vec![2, 6]);
    }

    #[tokio::test]
    async fn test_make_ignores_resume() {
        let target = Arc::new(MemoryTarget::default());
        let options = RunOptions {
            create_schema: true,
            users: CursorSpec {
                from: 2,
                from_end: true,
            },
            posts: CursorSpec {
                from: 7,
                from_end: true,
            },
            ..RunOptions::default()
        };

        let result = orchestrator(legacy(), &target)
            .run(options, Arc::new(AcceptAll))
            .await
            .unwrap();

        assert_eq!(result.users_start, 2);
        assert_eq!(result.posts_start, 7);
        assert_eq!(result.users.inserted, 1);
        assert_eq!(result.posts.scanned, 0);
    }

    #[tokio::test]
    async fn test_make_on_existing_schema_fails_and_closes() {
        let target = Arc::new(MemoryTarget::default());
        target.create_schema().await.unwrap();

        let err = orchestrator(legacy(), &target)
            .run(fresh(), Arc::new(AcceptAll))
            .await
            .unwrap_err();

        assert!(matches!(err, MigrateError::Write { .. }));
        let tables = target.snapshot();
        assert!(tables.closed);
        assert!(tables.users.is_empty());
    }

    #[tokio::test]
    async fn test_gate_only_used_with_ask() {
        let legacy = MemoryLegacy::default()
            .with_user(1)
            .with_post(post(1, "post", 0, "short"));

        let target = Arc::new(MemoryTarget::default());
        let gate = Arc::new(RecordingGate::default());
        let result = orchestrator(legacy, &target)
            .run(fresh(), gate.clone())
            .await
            .unwrap();
        assert!(gate.asked.lock().unwrap().is_empty());
        assert_eq!(result.posts.inserted, 1);

        let legacy = MemoryLegacy::default()
            .with_user(1)
            .with_post(post(1, "post", 0, "short"));
        let target = Arc::new(MemoryTarget::default());
        let options = RunOptions {
            ask: true,
            ..fresh()
        };
        let result = orchestrator(legacy, &target)
            .run(options, gate.clone())
            .await
            .unwrap();
        assert_eq!(*gate.asked.lock().unwrap(), vec![1]);
        assert_eq!(result.posts.declined, 1);
        assert!(target.snapshot().posts.is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let target = Arc::new(MemoryTarget::default());
        let orchestrator = orchestrator(MemoryLegacy::default(), &target);

        let health = orchestrator.health_check().await.unwrap();
        assert!(health.healthy);
        assert!(health.legacy_connected);
        assert!(health.target_error.is_none());

        orchestrator.close().await;
        assert!(target.snapshot().closed);
    }

    #[tokio::test]
    async fn test_result_to_json() {
        let target = Arc::new(MemoryTarget::default());
        let result = orchestrator(legacy(), &target)
            .run(fresh(), Arc::new(AcceptAll))
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["users"]["inserted"], 2);
        assert_eq!(json["posts"]["images_applied"], 1);
    }
}
