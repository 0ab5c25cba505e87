//! Per-pass counters.

use serde::{Deserialize, Serialize};

use crate::tags::TagOutcome;

/// Counters for the users pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPassStats {
    /// Identifiers visited.
    pub scanned: u64,
    /// Users written to the target.
    pub inserted: u64,
    /// Identifiers with no legacy row.
    pub missing: u64,
}

/// Counters for the posts pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPassStats {
    pub scanned: u64,
    pub missing: u64,
    /// Rows of a type that is never migrated (pages, menu items, ...).
    pub ineligible: u64,
    /// Short posts rejected at the confirmation prompt.
    pub declined: u64,
    pub inserted: u64,
    pub revisions_applied: u64,
    /// Revisions whose parent post is not in the target.
    pub revisions_orphaned: u64,
    pub images_applied: u64,
    /// Attachments whose parent post is not in the target.
    pub images_orphaned: u64,
    pub attachments_without_guid: u64,
    pub tags_created: u64,
    pub tags_reused: u64,
    pub links_created: u64,
    /// Post/tag pairs already linked, typically revisited after a resume.
    pub links_existing: u64,
    /// Term references that were not post tags.
    pub terms_ignored: u64,
}

impl PostPassStats {
    pub(crate) fn record_tag(&mut self, outcome: TagOutcome) {
        match outcome {
            TagOutcome::Ignored => self.terms_ignored += 1,
            TagOutcome::Created => {
                self.tags_created += 1;
                self.links_created += 1;
            }
            TagOutcome::Linked => {
                self.tags_reused += 1;
                self.links_created += 1;
            }
            TagOutcome::AlreadyLinked => {
                self.tags_reused += 1;
                self.links_existing += 1;
            }
        }
    }

    /// Rows written or updated in the posts table.
    pub fn posts_written(&self) -> u64 {
        self.inserted + self.revisions_applied + self.images_applied
    }
}
