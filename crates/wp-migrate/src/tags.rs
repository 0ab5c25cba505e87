//! Tag resolution: turns legacy `post_tag` terms into target tags and links.

use tracing::{debug, warn};

use crate::error::{MigrateError, Result};
use crate::model::{PostTagLink, Tag, POST_TAG_TAXONOMY};
use crate::store::{LegacyStore, TargetStore};

/// What happened to one term reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// Not a post tag (category, nav menu, ...); nothing written.
    Ignored,
    /// Tag row created, then linked.
    Created,
    /// Tag already existed; only linked.
    Linked,
    /// Tag and link both existed; nothing written.
    AlreadyLinked,
}

/// Resolves legacy taxonomy terms against the target tag table.
pub struct TagResolver<'a> {
    legacy: &'a dyn LegacyStore,
    target: &'a dyn TargetStore,
}

impl<'a> TagResolver<'a> {
    pub fn new(legacy: &'a dyn LegacyStore, target: &'a dyn TargetStore) -> Self {
        Self { legacy, target }
    }

    /// Resolve one term reference and link it to `post_id`.
    ///
    /// A tag id is inserted at most once and a post/tag pair is linked at
    /// most once, so rows revisited after a resume write nothing new.
    pub async fn resolve(&self, term_id: i64, post_id: i64) -> Result<TagOutcome> {
        match self.legacy.term_taxonomy(term_id).await? {
            Some(kind) if kind == POST_TAG_TAXONOMY => {}
            Some(kind) => {
                debug!("Term {} is a {}, not a tag", term_id, kind);
                return Ok(TagOutcome::Ignored);
            }
            None => {
                warn!(
                    "Term {} referenced by post {} has no taxonomy row, ignoring",
                    term_id, post_id
                );
                return Ok(TagOutcome::Ignored);
            }
        }

        let link = PostTagLink {
            post_id,
            tag_id: term_id,
        };

        let outcome = if self.target.tag_exists(term_id).await? {
            if self.target.link_exists(&link).await? {
                debug!("Post {} is already tagged {}", post_id, term_id);
                return Ok(TagOutcome::AlreadyLinked);
            }
            TagOutcome::Linked
        } else {
            let name = self
                .legacy
                .term_name(term_id)
                .await?
                .ok_or(MigrateError::MissingTerm(term_id))?;
            debug!("Creating tag {} ({})", term_id, name);
            self.target.insert_tag(&Tag { id: term_id, name }).await?;
            TagOutcome::Created
        };

        self.target.insert_post_tag(&link).await?;

        Ok(outcome)
    }
}
