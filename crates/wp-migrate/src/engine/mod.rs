//! Migration engine - the per-row cursor walk.
//!
//! Each pass visits every identifier from its start up to the legacy
//! maximum, one at a time. A row is fully processed (fetch, classify,
//! transform, tags, write) before the cursor moves. Gaps are skipped; any
//! store error aborts the pass and the resume cursor picks up from the last
//! committed row on the next run.

mod gate;
mod stats;

pub use gate::{AcceptAll, GateDecision, ShortPostGate};
pub use stats::{PostPassStats, UserPassStats};

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::{MigrationConfig, RevisionTagKey};
use crate::error::Result;
use crate::model::{LegacyPost, PostKind};
use crate::rewrite::ContentPipeline;
use crate::store::{LegacyStore, TargetStore};
use crate::tags::TagResolver;
use crate::transform::{classify, is_short, transform_post, transform_user};

/// Walks the legacy tables and writes the target rows.
pub struct MigrationEngine {
    legacy: Arc<dyn LegacyStore>,
    target: Arc<dyn TargetStore>,
    pipeline: Arc<ContentPipeline>,
    config: MigrationConfig,
    gate: Option<Arc<dyn ShortPostGate>>,
}

impl MigrationEngine {
    pub fn new(
        legacy: Arc<dyn LegacyStore>,
        target: Arc<dyn TargetStore>,
        pipeline: Arc<ContentPipeline>,
        config: MigrationConfig,
    ) -> Self {
        Self {
            legacy,
            target,
            pipeline,
            config,
            gate: None,
        }
    }

    /// Ask `gate` before migrating short posts.
    pub fn with_gate(mut self, gate: Arc<dyn ShortPostGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Migrate users from `start` up to the legacy maximum.
    pub async fn migrate_users(&self, start: i64) -> Result<UserPassStats> {
        let mut stats = UserPassStats::default();

        let Some(max) = self.legacy.max_user_id().await? else {
            info!("No users found, users will not be migrated");
            return Ok(stats);
        };
        info!("Migrating users {}..={}", start, max);

        let mut id = start;
        while id <= max {
            stats.scanned += 1;
            if let Err(e) = self.migrate_user(id, &mut stats).await {
                error!("Users pass aborted at id {}: {}", id, e);
                return Err(e);
            }
            id += 1;
        }

        info!(
            "Users pass done: {} inserted, {} missing",
            stats.inserted, stats.missing
        );
        Ok(stats)
    }

    async fn migrate_user(&self, id: i64, stats: &mut UserPassStats) -> Result<()> {
        let Some(user) = self.legacy.fetch_user(id).await? else {
            stats.missing += 1;
            return Ok(());
        };

        self.target.insert_user(&transform_user(&user)).await?;
        stats.inserted += 1;
        debug!("User {} migrated", id);
        Ok(())
    }

    /// Migrate posts, revisions and attachments from `start` up to the
    /// legacy maximum.
    pub async fn migrate_posts(&self, start: i64) -> Result<PostPassStats> {
        let mut stats = PostPassStats::default();

        let Some(max) = self.legacy.max_post_id().await? else {
            info!("No posts found, posts will not be migrated");
            return Ok(stats);
        };
        info!("Migrating posts {}..={}", start, max);

        let mut id = start;
        while id <= max {
            stats.scanned += 1;
            let step = match self.legacy.fetch_post(id).await {
                Ok(Some(post)) => self.migrate_post(post, &mut stats).await,
                Ok(None) => {
                    stats.missing += 1;
                    Ok(())
                }
                Err(e) => Err(e),
            };
            if let Err(e) = step {
                error!("Posts pass aborted at id {}: {}", id, e);
                return Err(e);
            }
            id += 1;
        }

        info!(
            "Posts pass done: {} inserted, {} revisions, {} images, {} tags created, {} links \
             ({} already present), {} ineligible, {} declined, {} missing",
            stats.inserted,
            stats.revisions_applied,
            stats.images_applied,
            stats.tags_created,
            stats.links_created,
            stats.links_existing,
            stats.ineligible,
            stats.declined,
            stats.missing
        );
        Ok(stats)
    }

    async fn migrate_post(&self, post: LegacyPost, stats: &mut PostPassStats) -> Result<()> {
        let kind = classify(&post);
        if !kind.is_eligible() {
            debug!("Post {} has type {}, skipping", post.id, post.post_type);
            stats.ineligible += 1;
            return Ok(());
        }

        if kind != PostKind::Attachment && !self.confirm_short_post(&post).await? {
            debug!("Post {} declined", post.id);
            stats.declined += 1;
            return Ok(());
        }

        match kind {
            PostKind::Post => {
                let row = transform_post(&post, &self.pipeline);
                self.target.insert_post(&row).await?;
                stats.inserted += 1;
                debug!("Post {} migrated", post.id);

                self.link_tags(post.id, post.id, stats).await?;
            }
            PostKind::Revision => {
                let row = transform_post(&post, &self.pipeline);
                let matched = self
                    .target
                    .update_post_content(post.parent, &row.title, &row.content)
                    .await?;
                if matched == 0 {
                    debug!(
                        "Revision {} targets post {} which was not migrated",
                        post.id, post.parent
                    );
                    stats.revisions_orphaned += 1;
                    return Ok(());
                }
                stats.revisions_applied += 1;
                debug!("Revision {} applied to post {}", post.id, post.parent);

                let link_id = match self.config.revision_tag_key {
                    RevisionTagKey::Parent => post.parent,
                    RevisionTagKey::Revision => post.id,
                };
                self.link_tags(post.id, link_id, stats).await?;
            }
            PostKind::Attachment => {
                if post.guid.is_empty() {
                    stats.attachments_without_guid += 1;
                    return Ok(());
                }
                let image = self.pipeline.rewrite_media_url(&post.guid);
                let matched = self.target.update_post_image(post.parent, &image).await?;
                if matched == 0 {
                    stats.images_orphaned += 1;
                } else {
                    stats.images_applied += 1;
                    debug!("Attachment {} set image of post {}", post.id, post.parent);
                }
            }
            PostKind::Other(_) => {}
        }

        Ok(())
    }

    /// Returns `false` when the gate rejects a short post.
    async fn confirm_short_post(&self, post: &LegacyPost) -> Result<bool> {
        let Some(gate) = &self.gate else {
            return Ok(true);
        };
        if !is_short(post, self.config.short_post_threshold) {
            return Ok(true);
        }
        Ok(gate.decide(post).await? == GateDecision::Keep)
    }

    /// Resolve the terms attached to legacy row `lookup_id` and link them to
    /// target post `link_id`.
    async fn link_tags(&self, lookup_id: i64, link_id: i64, stats: &mut PostPassStats) -> Result<()> {
        let terms = self.legacy.term_relationships(lookup_id).await?;
        if terms.is_empty() {
            return Ok(());
        }

        let resolver = TagResolver::new(self.legacy.as_ref(), self.target.as_ref());
        for term_id in terms {
            let outcome = resolver.resolve(term_id, link_id).await?;
            stats.record_tag(outcome);
        }
        Ok(())
    }
}
