//! Row classification and mapping from legacy rows to target rows.

use crate::model::{LegacyPost, LegacyUser, PostKind, TargetPost, TargetUser};
use crate::rewrite::ContentPipeline;

/// Classify a legacy post row by its type tag.
pub fn classify(post: &LegacyPost) -> PostKind {
    match post.post_type.as_str() {
        "post" => PostKind::Post,
        "revision" => PostKind::Revision,
        "attachment" => PostKind::Attachment,
        other => PostKind::Other(other.to_string()),
    }
}

/// Whether a body is shorter than `threshold` characters.
pub fn is_short(post: &LegacyPost, threshold: usize) -> bool {
    post.content.chars().count() < threshold
}

/// Map a legacy user. The nicename becomes the username.
pub fn transform_user(user: &LegacyUser) -> TargetUser {
    TargetUser {
        id: user.id,
        username: user.nicename.clone(),
        email: user.email.clone(),
    }
}

/// Map a legacy `post` or `revision` row to a target post.
///
/// The local creation time has no zone attached and is read as UTC; a zero
/// date maps to 0. The image is left empty for attachments to fill in.
pub fn transform_post(post: &LegacyPost, pipeline: &ContentPipeline) -> TargetPost {
    TargetPost {
        id: post.id,
        author: post.author,
        date: post.date.map(|d| d.and_utc().timestamp()).unwrap_or(0),
        title: post.title.clone(),
        image: String::new(),
        content: pipeline.rewrite_body(&post.content),
    }
}
